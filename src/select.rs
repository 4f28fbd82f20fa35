//! select — C8: partial-match queries. A query supplies one term per
//! attribute: a literal value, `?` (value may be anything), or a
//! pattern containing one or more `%` wildcards anchored at both ends
//! of the field (e.g. `%ab%cd` matches any value ending in `cd` with
//! `ab` appearing somewhere before it).
//!
//! Pattern matching is done with one hand-written anchored-substring
//! matcher, used consistently everywhere a term needs matching; there
//! is no second, regex-based code path to keep in sync with it.

use std::collections::BTreeSet;

use crate::bits::{bit_is_set, get_lower, set_bit};
use crate::chvec::ChoiceVector;
use crate::consts::{MAXBITS, NO_PAGE};
use crate::error::Result;
use crate::hash::hash_any;
use crate::reln::Relation;
use crate::tuple::split_fields;

/// Parse a query string into exactly `nattrs` per-attribute terms.
/// Fewer terms than attributes are right-padded with `?`; extra terms
/// beyond `nattrs` are silently dropped rather than rejected — a query
/// is read one term per attribute and stops there, the same way a
/// tuple's trailing fields are never inspected once every attribute has
/// a value.
pub fn parse_query(query: &str, nattrs: usize) -> Result<Vec<String>> {
    let trimmed = query.trim();
    let mut fields: Vec<String> = if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split(',').map(|s| s.to_string()).collect()
    };
    fields.truncate(nattrs);
    while fields.len() < nattrs {
        fields.push("?".to_string());
    }
    Ok(fields)
}

/// Match one query term against one stored field value.
///
/// - `?` matches any value.
/// - a term with no `%` must equal the value exactly.
/// - a term with one or more `%` is split on `%` into segments; a
///   leading/trailing segment is anchored to the start/end of the
///   value unless the term itself starts/ends with `%`, and interior
///   segments must appear, in order, as substrings between the
///   anchors.
pub fn match_pattern(pattern: &str, value: &str) -> bool {
    if pattern == "?" {
        return true;
    }
    if !pattern.contains('%') {
        return pattern == value;
    }

    let anchored_start = !pattern.starts_with('%');
    let anchored_end = !pattern.ends_with('%');
    let segments: Vec<&str> = pattern.split('%').filter(|s| !s.is_empty()).collect();

    if segments.is_empty() {
        // pattern is made up entirely of '%'
        return true;
    }

    let mut rest = value;
    let last_idx = segments.len() - 1;

    if anchored_start {
        let first = segments[0];
        if !rest.starts_with(first) {
            return false;
        }
        rest = &rest[first.len()..];
    }

    let middle_start = if anchored_start { 1 } else { 0 };
    let middle_end = if anchored_end { last_idx } else { segments.len() };

    for seg in &segments[middle_start..middle_end] {
        match rest.find(seg) {
            Some(idx) => rest = &rest[idx + seg.len()..],
            None => return false,
        }
    }

    if anchored_end {
        let last = segments[last_idx];
        if !rest.ends_with(last) {
            return false;
        }
    }

    true
}

fn matches_tuple(fields: &[String], tuple: &str, nattrs: usize) -> Result<bool> {
    let parts = split_fields(tuple, nattrs)?;
    Ok(fields.iter().zip(parts.iter()).all(|(pat, val)| match_pattern(pat, val)))
}

/// A query term is "known" for addressing purposes only if it pins the
/// attribute to one exact value: a plain literal. `?` and any `%`
/// pattern leave the attribute free, since they admit more than one
/// hash value.
fn known_attr_hashes(fields: &[String]) -> Vec<Option<u32>> {
    fields
        .iter()
        .map(|f| {
            if f == "?" || f.contains('%') {
                None
            } else {
                Some(hash_any(f.as_bytes()))
            }
        })
        .collect()
}

/// Enumerate the candidate bucket ids a query could have landed in.
///
/// For each composite-hash bit `i` among the low `depth + 1` positions
/// (the most bits ever consulted by the addressing rule), look up
/// `(att, bit) = cv[i]`: if `att` is known, that bit of the composite
/// hash is fixed; otherwise it is free. Enumerate every assignment of
/// the free bits, and for each one apply the same bucket-addressing
/// rule `reln::bucket_for_hash` uses (low `depth` bits, or low
/// `depth + 1` bits if that falls below `sp`), collecting the
/// distinct resulting bucket ids. A query with every attribute unknown
/// degenerates to "every bucket"; a query that pins every attribute
/// degenerates to exactly one bucket, as a full tuple hash would.
fn gen_candidates(cv: &ChoiceVector, known: &[Option<u32>], depth: u32, sp: u32) -> Vec<u32> {
    let relevant = (depth + 1).min(MAXBITS as u32) as usize;
    let mut base = 0u32;
    let mut free_bits = Vec::new();

    for (i, entry) in cv.entries().iter().enumerate().take(relevant) {
        match known.get(entry.att as usize).copied().flatten() {
            Some(h) => {
                if bit_is_set(h, entry.bit as usize) {
                    base = set_bit(base, i);
                }
            }
            None => free_bits.push(i),
        }
    }

    let combos: u64 = 1u64 << free_bits.len();
    let mut candidates = BTreeSet::new();
    for mask in 0..combos {
        let mut v = base;
        for (j, &bit_idx) in free_bits.iter().enumerate() {
            if (mask >> j) & 1 == 1 {
                v = set_bit(v, bit_idx);
            }
        }
        let low_d = get_lower(v, depth);
        let bucket = if low_d < sp { get_lower(v, depth + 1) } else { low_d };
        candidates.insert(bucket);
    }
    candidates.into_iter().collect()
}

/// A partial-match scan in progress over a relation. Holds its own
/// resumable cursor: which candidate bucket it is on, which page of
/// that bucket's chain, and how far into that page's tuple list.
pub struct Selection<'r> {
    reln: &'r mut Relation,
    fields: Vec<String>,
    nattrs: usize,
    candidates: Vec<u32>,
    cand_idx: usize,
    next_ovflow: u32,
    cur_tuples: Vec<String>,
    cur_pos: usize,
}

impl<'r> Selection<'r> {
    /// Begin a partial-match scan. `query` is right-padded with `?` if
    /// it names fewer than `nattrs` terms.
    pub fn start(reln: &'r mut Relation, query: &str) -> Result<Selection<'r>> {
        let nattrs = reln.nattrs() as usize;
        let fields = parse_query(query, nattrs)?;
        let known = known_attr_hashes(&fields);
        let candidates = gen_candidates(reln.cv(), &known, reln.depth(), reln.sp());
        Ok(Selection {
            reln,
            fields,
            nattrs,
            candidates,
            cand_idx: 0,
            next_ovflow: NO_PAGE,
            cur_tuples: Vec::new(),
            cur_pos: 0,
        })
    }

    /// Number of distinct buckets this scan will visit. Exposed for
    /// `stats`-style diagnostics, not required for correctness.
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Load the next page in scan order (the current chain's next
    /// overflow page, or the next candidate bucket's primary).
    /// Returns `false` once the scan is exhausted.
    fn advance_page(&mut self) -> Result<bool> {
        if self.next_ovflow != NO_PAGE {
            let page = self.reln.ovflow_page(self.next_ovflow)?;
            self.next_ovflow = page.ovflow();
            self.cur_tuples = page.tuples_owned();
            self.cur_pos = 0;
            return Ok(true);
        }
        if self.cand_idx >= self.candidates.len() {
            return Ok(false);
        }
        let bucket = self.candidates[self.cand_idx];
        self.cand_idx += 1;
        let page = self.reln.data_page(bucket)?;
        self.next_ovflow = page.ovflow();
        self.cur_tuples = page.tuples_owned();
        self.cur_pos = 0;
        Ok(true)
    }

    /// Return the next matching tuple, or `None` once the scan has
    /// visited every candidate bucket's full chain.
    pub fn next_tuple(&mut self) -> Result<Option<String>> {
        loop {
            if self.cur_pos < self.cur_tuples.len() {
                let t = self.cur_tuples[self.cur_pos].clone();
                self.cur_pos += 1;
                if matches_tuple(&self.fields, &t, self.nattrs)? {
                    return Ok(Some(t));
                }
                continue;
            }
            if !self.advance_page()? {
                return Ok(None);
            }
        }
    }

    /// Explicitly end the scan. A no-op in practice: the borrow of
    /// `Relation` simply ends when `self` is dropped, but an explicit
    /// close reads better at call sites than letting the value fall out
    /// of scope.
    pub fn close(self) {}
}

impl<'r> Iterator for Selection<'r> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Result<String>> {
        match self.next_tuple() {
            Ok(Some(t)) => Some(Ok(t)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
