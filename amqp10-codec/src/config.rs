/// Bounds enforced while decoding untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Limits {
    /// Nesting of lists, maps, arrays and described values
    pub max_depth: usize,
    /// Number of elements of a single list, map or array. Other elements need at least one byte each, but arrays of
    /// payload-free constructors (null, true, false, uint0, ulong0, list0) need none, so this alone bounds how far a
    /// few input bytes can expand.
    pub max_container_len: usize,
    /// Number of bytes of a single binary, string or symbol
    pub max_payload_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_container_len: 1 << 20,
            max_payload_len: 64 * 1024 * 1024,
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::Limits;

    #[test]
    fn partial_config() {
        let limits: Limits = serde_json::from_str(r#"{ "max_depth": 8 }"#).unwrap();
        assert_eq!(Limits { max_depth: 8, ..Limits::default() }, limits);
    }
}
