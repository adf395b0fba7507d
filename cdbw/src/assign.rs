//! Node assignment (component E): turns a peeled hypergraph into the
//! `g` table that the final minimal perfect hash function reads from.
//!
//! Ported directly from the original `assign_nodes`: walking
//! `output_order` from its front (the vertex peeled *last*) towards its
//! back (the vertex peeled *first*) visits, at each edge, exactly one
//! vertex that no earlier step in this same walk has touched yet — the
//! other two are already fixed, either by an earlier step here or
//! because they were never part of the peeled core and keep their
//! default `0`. Solving the 3-term sum for that one vertex modulo
//! `data_entries` is what makes `(g[left] + g[middle] + g[right]) %
//! data_entries == idx` hold for every key once all vertices are
//! visited.

use crate::graph::Edge;

/// Computes the `g` table (length `entries`) from a peeled hypergraph.
///
/// `data_entries` is the modulus — the number of records the final
/// index must be able to address (`0` is treated as `1` to keep the
/// modulus well-defined; callers never invoke this with zero records).
pub(crate) fn assign(entries: u32, data_entries: u32, edges: &[Edge], output_order: &[u32]) -> Vec<u32> {
    let modulus = data_entries.max(1) as u64;
    let mut g = vec![0u32; entries as usize];
    let mut visited = vec![false; entries as usize];

    for &edge_i in output_order {
        let e = &edges[edge_i as usize];
        let (l, m, r) = (e.left as usize, e.middle as usize, e.right as usize);
        let idx = e.idx as u64;

        if !visited[l] {
            g[l] = ((2 * modulus + idx - g[m] as u64 - g[r] as u64) % modulus) as u32;
        } else if !visited[m] {
            g[m] = ((2 * modulus + idx - g[l] as u64 - g[r] as u64) % modulus) as u32;
        } else {
            g[r] = ((2 * modulus + idx - g[l] as u64 - g[m] as u64) % modulus) as u32;
        }
        visited[l] = true;
        visited[m] = true;
        visited[r] = true;
    }

    g
}

/// Evaluates the assigned `g` table against a key's vertex triple,
/// returning the data index the minimal perfect hash function resolves
/// it to.
pub(crate) fn evaluate(g: &[u32], data_entries: u32, left: u32, middle: u32, right: u32) -> u32 {
    let modulus = data_entries.max(1) as u64;
    ((g[left as usize] as u64 + g[middle as usize] as u64 + g[right as usize] as u64) % modulus) as u32
}
