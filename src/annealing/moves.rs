//! Random neighbourhood moves on index plans.
//!
//! Moves never create or drop customers: every move permutes the customers
//! already in the plan, except that relocate may pull one out of the pool
//! of unrouted customers.

use rand::Rng;

use super::MoveKind;

/// Customer indices per vehicle slot plus the unrouted pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Plan {
    pub routes: Vec<Vec<usize>>,
    pub pool: Vec<usize>,
}

impl Plan {
    /// Plan with one customer-index route per vehicle slot and an unrouted pool.
    pub fn new(routes: Vec<Vec<usize>>, pool: Vec<usize>) -> Self {
        Self { routes, pool }
    }

    fn non_empty(&self, min_len: usize) -> Vec<usize> {
        (0..self.routes.len())
            .filter(|&k| self.routes[k].len() >= min_len.max(1))
            .collect()
    }
}

/// Generates a neighbour of `plan` using one of `moves`.
///
/// Starts from a randomly chosen move and falls through the list in order
/// until one applies. Returns `None` if none does.
pub(crate) fn neighbour<R: Rng>(plan: &Plan, moves: &[MoveKind], rng: &mut R) -> Option<Plan> {
    if moves.is_empty() {
        return None;
    }
    let start = rng.random_range(0..moves.len());
    for offset in 0..moves.len() {
        let kind = moves[(start + offset) % moves.len()];
        let mut candidate = plan.clone();
        if apply(kind, &mut candidate, rng) {
            return Some(candidate);
        }
    }
    None
}

/// Applies `kind` in place. Returns `false` if the plan admits no such move.
pub(crate) fn apply<R: Rng>(kind: MoveKind, plan: &mut Plan, rng: &mut R) -> bool {
    match kind {
        MoveKind::Relocate => relocate(plan, rng),
        MoveKind::Swap => swap(plan, rng),
        MoveKind::Reverse => reverse(plan, rng),
        MoveKind::Reassign => reassign(plan, rng),
    }
}

fn relocate<R: Rng>(plan: &mut Plan, rng: &mut R) -> bool {
    if plan.routes.is_empty() {
        return false;
    }
    let mut sources: Vec<Option<usize>> = plan.non_empty(1).into_iter().map(Some).collect();
    if !plan.pool.is_empty() {
        sources.push(None);
    }
    if sources.is_empty() {
        return false;
    }
    let customer = match sources[rng.random_range(0..sources.len())] {
        Some(k) => {
            let pos = rng.random_range(0..plan.routes[k].len());
            plan.routes[k].remove(pos)
        }
        None => {
            let pos = rng.random_range(0..plan.pool.len());
            plan.pool.remove(pos)
        }
    };
    let to = rng.random_range(0..plan.routes.len());
    let pos = rng.random_range(0..=plan.routes[to].len());
    plan.routes[to].insert(pos, customer);
    true
}

fn swap<R: Rng>(plan: &mut Plan, rng: &mut R) -> bool {
    let routes = plan.non_empty(1);
    if routes.len() < 2 {
        return false;
    }
    let i = rng.random_range(0..routes.len());
    let mut j = rng.random_range(0..routes.len() - 1);
    if j >= i {
        j += 1;
    }
    let (a, b) = (routes[i], routes[j]);
    let pa = rng.random_range(0..plan.routes[a].len());
    let pb = rng.random_range(0..plan.routes[b].len());
    let tmp = plan.routes[a][pa];
    plan.routes[a][pa] = plan.routes[b][pb];
    plan.routes[b][pb] = tmp;
    true
}

fn reverse<R: Rng>(plan: &mut Plan, rng: &mut R) -> bool {
    let routes = plan.non_empty(2);
    if routes.is_empty() {
        return false;
    }
    let k = routes[rng.random_range(0..routes.len())];
    let len = plan.routes[k].len();
    let i = rng.random_range(0..len - 1);
    let j = rng.random_range(i + 1..len);
    plan.routes[k][i..=j].reverse();
    true
}

fn reassign<R: Rng>(plan: &mut Plan, rng: &mut R) -> bool {
    let routes = plan.non_empty(1);
    if routes.is_empty() || plan.routes.len() < 2 {
        return false;
    }
    let a = routes[rng.random_range(0..routes.len())];
    let mut b = rng.random_range(0..plan.routes.len() - 1);
    if b >= a {
        b += 1;
    }
    plan.routes.swap(a, b);
    true
}
