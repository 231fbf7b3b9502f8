//! Member Object with Small String Optimization (SSO)
//!
//! Members up to 23 bytes are stored inline without heap allocation.
//! Most sorted-set members are short identifiers ("user:123", "job:abc"),
//! so inline storage keeps node allocation to a single arena slot.
//!
//! A `Member` is immutable once built. Ordering is lexicographic over the
//! raw bytes, with a shorter prefix-equal sequence sorting first.

use crate::error::SkipListError;
use std::cmp::Ordering;
use std::fmt;

/// Small String Optimization threshold - members up to this size are stored inline
const SSO_MAX_LEN: usize = 23;

/// Immutable, binary-safe member bytes
///
/// Built only through `try_new`, `from_vec` or the `From` impls, so the
/// inline length never exceeds `SSO_MAX_LEN`.
#[derive(Clone)]
pub struct Member(Repr);

#[derive(Clone)]
enum Repr {
    /// Inline storage for small members (no heap allocation)
    Inline { len: u8, data: [u8; SSO_MAX_LEN] },
    /// Heap storage for larger members
    Heap(Box<[u8]>),
}

impl Member {
    /// Verify all invariants hold for this member
    #[cfg(debug_assertions)]
    fn verify_invariants(&self) {
        if let Repr::Inline { len, .. } = &self.0 {
            debug_assert!(
                (*len as usize) <= SSO_MAX_LEN,
                "Invariant violated: inline len {} exceeds SSO_MAX_LEN {}",
                len,
                SSO_MAX_LEN
            );
        }
        debug_assert_eq!(
            self.as_bytes().len(),
            self.len(),
            "Invariant violated: as_bytes().len() must equal len()"
        );
    }

    #[cfg(not(debug_assertions))]
    #[inline(always)]
    fn verify_invariants(&self) {}

    /// Build a member by copying `bytes`.
    ///
    /// Heap-backed members reserve their buffer fallibly so an exhausted
    /// allocator is reported instead of aborting the process.
    pub fn try_new(bytes: &[u8]) -> Result<Self, SkipListError> {
        let member = if bytes.len() <= SSO_MAX_LEN {
            Self::inline(bytes)
        } else {
            let mut buf = Vec::new();
            buf.try_reserve_exact(bytes.len())
                .map_err(|_| SkipListError::AllocationFailed {
                    requested: bytes.len(),
                })?;
            buf.extend_from_slice(bytes);
            Member(Repr::Heap(buf.into_boxed_slice()))
        };

        member.verify_invariants();
        Ok(member)
    }

    /// Build a member from an owned buffer, reusing its allocation when large
    #[inline]
    pub fn from_vec(data: Vec<u8>) -> Self {
        let member = if data.len() <= SSO_MAX_LEN {
            Self::inline(&data)
        } else {
            Member(Repr::Heap(data.into_boxed_slice()))
        };
        member.verify_invariants();
        member
    }

    #[inline]
    fn inline(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() <= SSO_MAX_LEN);
        let mut data = [0u8; SSO_MAX_LEN];
        data[..bytes.len()].copy_from_slice(bytes);
        Member(Repr::Inline {
            len: bytes.len() as u8,
            data,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        match &self.0 {
            Repr::Inline { len, .. } => *len as usize,
            Repr::Heap(data) => data.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match &self.0 {
            Repr::Inline { len, data } => &data[..*len as usize],
            Repr::Heap(data) => data,
        }
    }

    /// Lossy UTF-8 rendering, for logs and dumps
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }

    pub fn into_vec(self) -> Vec<u8> {
        match self.0 {
            Repr::Inline { len, data } => data[..len as usize].to_vec(),
            Repr::Heap(data) => data.into_vec(),
        }
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Member {}

impl PartialOrd for Member {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Member {
    /// Byte-wise comparison over the common prefix, then by length.
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl std::hash::Hash for Member {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl std::borrow::Borrow<[u8]> for Member {
    fn borrow(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for Member {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<&[u8]> for Member {
    fn from(bytes: &[u8]) -> Self {
        Member::from_vec(bytes.to_vec())
    }
}

impl From<&str> for Member {
    fn from(s: &str) -> Self {
        Member::from(s.as_bytes())
    }
}

impl From<Vec<u8>> for Member {
    fn from(data: Vec<u8>) -> Self {
        Member::from_vec(data)
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Member({:?})", self.to_string_lossy())
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}
