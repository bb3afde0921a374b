use bytes::Bytes;
use std::fmt;

/// Opaque unit of application data.
///
/// Both halves are reference counted, cloning a payload never copies the bytes.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Payload {
    data: Bytes,
    metadata: Option<Bytes>,
}

impl Payload {
    #[inline]
    pub fn new(data: impl Into<Bytes>, metadata: Option<Bytes>) -> Self {
        Self { data: data.into(), metadata }
    }

    #[inline]
    pub fn from_data(data: impl Into<Bytes>) -> Self {
        Self { data: data.into(), metadata: None }
    }

    /// Payload for METADATA_PUSH, the data half stays empty.
    #[inline]
    pub fn from_metadata(metadata: impl Into<Bytes>) -> Self {
        Self { data: Bytes::new(), metadata: Some(metadata.into()) }
    }

    #[inline(always)]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    #[inline(always)]
    pub fn metadata(&self) -> Option<&Bytes> {
        self.metadata.as_ref()
    }

    #[inline]
    pub fn data_utf8(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    #[inline]
    pub fn metadata_utf8(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| std::str::from_utf8(m).ok())
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Payload(data={} bytes", self.data.len())?;
        if let Some(m) = self.metadata.as_ref() {
            write!(f, ", metadata={} bytes", m.len())?;
        }
        write!(f, ")")
    }
}

impl From<&'static str> for Payload {
    #[inline]
    fn from(s: &'static str) -> Self {
        Self::from_data(Bytes::from_static(s.as_bytes()))
    }
}

impl From<String> for Payload {
    #[inline]
    fn from(s: String) -> Self {
        Self::from_data(s)
    }
}

impl From<Vec<u8>> for Payload {
    #[inline]
    fn from(v: Vec<u8>) -> Self {
        Self::from_data(v)
    }
}
