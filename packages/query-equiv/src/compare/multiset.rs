/// How elements of two unordered collections are paired up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Each left element, in order, claims the first unclaimed equal right element. Cheap and
    /// deterministic, but an early claim can starve a later element that had no other partner.
    #[default]
    Greedy,
    /// Maximum bipartite matching via augmenting paths. Finds a pairing whenever one exists.
    Bipartite,
}

/// Pairs elements of `left` with equal elements of `right`.
///
/// Returns, for each left element, the index of the right element it claimed, if any. Each right
/// element is claimed at most once.
pub fn claim<L, R>(
    left: &[L],
    right: &[R],
    strategy: MatchStrategy,
    eq: impl Fn(&L, &R) -> bool,
) -> Vec<Option<usize>> {
    match strategy {
        MatchStrategy::Greedy => claim_greedy(left, right, eq),
        MatchStrategy::Bipartite => claim_bipartite(left, right, eq),
    }
}

/// Matches `left` against `right` as multisets.
///
/// On success returns the index in `right` paired with each element of `left`. On failure returns the
/// index of the first left element that found no partner, or `left.len()` when only the lengths differ.
pub fn match_multiset<L, R>(
    left: &[L],
    right: &[R],
    strategy: MatchStrategy,
    eq: impl Fn(&L, &R) -> bool,
) -> Result<Vec<usize>, usize> {
    let claims = claim(left, right, strategy, eq);

    let mut pairs = Vec::with_capacity(claims.len());
    for (position, claimed) in claims.into_iter().enumerate() {
        match claimed {
            Some(index) => pairs.push(index),
            None => return Err(position),
        }
    }

    if left.len() != right.len() {
        return Err(left.len());
    }

    Ok(pairs)
}

fn claim_greedy<L, R>(left: &[L], right: &[R], eq: impl Fn(&L, &R) -> bool) -> Vec<Option<usize>> {
    let mut taken = vec![false; right.len()];

    left.iter()
        .map(|l| {
            let index = right
                .iter()
                .enumerate()
                .position(|(index, r)| !taken[index] && eq(l, r))?;
            taken[index] = true;
            Some(index)
        })
        .collect()
}

fn claim_bipartite<L, R>(
    left: &[L],
    right: &[R],
    eq: impl Fn(&L, &R) -> bool,
) -> Vec<Option<usize>> {
    let edges: Vec<Vec<usize>> = left
        .iter()
        .map(|l| {
            right
                .iter()
                .enumerate()
                .filter(|(_, r)| eq(l, r))
                .map(|(index, _)| index)
                .collect()
        })
        .collect();

    let mut owner: Vec<Option<usize>> = vec![None; right.len()];

    for l in 0..left.len() {
        let mut visited = vec![false; right.len()];
        augment(l, &edges, &mut owner, &mut visited);
    }

    let mut claims = vec![None; left.len()];
    for (r, l) in owner.iter().enumerate() {
        if let Some(l) = l {
            claims[*l] = Some(r);
        }
    }
    claims
}

fn augment(
    l: usize,
    edges: &[Vec<usize>],
    owner: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    for &r in &edges[l] {
        if visited[r] {
            continue;
        }
        visited[r] = true;

        let free = match owner[r] {
            None => true,
            Some(other) => augment(other, edges, owner, visited),
        };

        if free {
            owner[r] = Some(l);
            return true;
        }
    }
    false
}
