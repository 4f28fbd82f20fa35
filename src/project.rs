//! project — C9: attribute projection over a selected tuple. Not part
//! of the core storage/query engine, but a thin convenience layer the
//! CLI's `select --project` flag sits on top of.
//!
//! A projection spec is either `*` (every attribute, in order) or a
//! comma-separated list of 1-based attribute indices.

use crate::error::{MalhError, Result};
use crate::tuple::split_fields;

/// A parsed projection: either "all attributes" or an explicit,
/// possibly reordered/duplicated, list of 0-based attribute indices.
#[derive(Debug, Clone)]
pub enum Projection {
    All,
    Attrs(Vec<usize>),
}

impl Projection {
    /// Parse a projection spec against a relation of `nattrs`
    /// attributes. `"*"` means every attribute; otherwise a
    /// comma-separated list of 1-based indices, e.g. `"2,1"` to swap
    /// and keep only the first two attributes.
    pub fn parse(spec: &str, nattrs: u32) -> Result<Self> {
        let spec = spec.trim();
        if spec == "*" {
            return Ok(Projection::All);
        }
        let mut attrs = Vec::new();
        for tok in spec.split(',') {
            let tok = tok.trim();
            let one_based: u32 = tok.parse().map_err(|_| MalhError::MalformedQuery {
                query: spec.to_string(),
                expected: nattrs as usize,
            })?;
            if one_based == 0 || one_based > nattrs {
                return Err(MalhError::MalformedQuery {
                    query: spec.to_string(),
                    expected: nattrs as usize,
                });
            }
            attrs.push((one_based - 1) as usize);
        }
        Ok(Projection::Attrs(attrs))
    }

    /// Apply this projection to a stored tuple, returning the
    /// projected fields re-joined with commas.
    pub fn project(&self, tuple: &str, nattrs: usize) -> Result<String> {
        let fields = split_fields(tuple, nattrs)?;
        match self {
            Projection::All => Ok(fields.join(",")),
            Projection::Attrs(idxs) => {
                let picked: Vec<&str> = idxs.iter().map(|&i| fields[i]).collect();
                Ok(picked.join(","))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_projection_passes_through() {
        let p = Projection::parse("*", 3).unwrap();
        assert_eq!(p.project("a,b,c", 3).unwrap(), "a,b,c");
    }

    #[test]
    fn explicit_projection_selects_and_reorders() {
        let p = Projection::parse("2,1", 3).unwrap();
        assert_eq!(p.project("a,b,c", 3).unwrap(), "b,a");
    }

    #[test]
    fn rejects_out_of_range_index() {
        let err = Projection::parse("0,1", 3).unwrap_err();
        assert!(matches!(err, MalhError::MalformedQuery { .. }));
        let err = Projection::parse("4", 3).unwrap_err();
        assert!(matches!(err, MalhError::MalformedQuery { .. }));
    }
}
