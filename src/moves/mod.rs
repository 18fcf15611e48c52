//! Neighborhood-move library shared by every search engine.
//!
//! Each move takes an encoding by reference and returns a new, owned
//! encoding; none of them mutate their input. Dispatch is through the
//! tagged [`Move`] enum and [`apply`], rather than runtime duck-typing.

use crate::objective::{score, Weights};
use crate::problem::Problem;
use crate::rng::RngSource;
use crate::{Encoding, MachineId, TaskId};

/// A neighborhood operator. Variants carry their own parameters
/// (`ShuffleMachine(k)`, `LookaheadInsertion(attempts)`) so selection is
/// a single match, never a keyword bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    RandomMove,
    BlockMove,
    IntraMachineSwap,
    InterMachineSwap,
    ShuffleMachine(usize),
    Regenerate,
    LookaheadInsertion(usize),
    PartialPrecedenceRepair,
}

/// Everything a move needs beyond the encoding and the RNG: the problem
/// instance (for `regenerate`'s task count, `partial_precedence_repair`'s
/// precedences) and the weights (for `lookahead_insertion`'s internal
/// scoring).
pub struct MoveContext<'a> {
    pub problem: &'a Problem,
    pub weights: &'a Weights,
}

/// Applies `mv` to `encoding`, returning a new encoding. `encoding` is
/// never mutated.
pub fn apply(mv: Move, encoding: &Encoding, rng: &mut RngSource, ctx: &MoveContext) -> Encoding {
    match mv {
        Move::RandomMove => random_move(encoding, rng),
        Move::BlockMove => block_move(encoding, rng),
        Move::IntraMachineSwap => intra_machine_swap(encoding, rng),
        Move::InterMachineSwap => inter_machine_swap(encoding, rng),
        Move::ShuffleMachine(k) => shuffle_machine(encoding, k, rng),
        Move::Regenerate => regenerate(ctx.problem, rng),
        Move::LookaheadInsertion(attempts) => lookahead_insertion(encoding, attempts, rng, ctx),
        Move::PartialPrecedenceRepair => partial_precedence_repair(encoding, ctx.problem),
    }
}

pub fn random_move(encoding: &Encoding, rng: &mut RngSource) -> Encoding {
    let mut enc = encoding.clone();
    let n = enc.len();
    if n < 2 {
        return enc;
    }
    let nonempty: Vec<MachineId> = (0..n).filter(|&m| !enc[m].is_empty()).collect();
    let Some(&a) = rng.choose(&nonempty) else {
        return enc;
    };
    let mut b = rng.uniform_usize(n);
    while b == a {
        b = rng.uniform_usize(n);
    }
    let idx = rng.uniform_usize(enc[a].len());
    let task = enc[a].remove(idx);
    let insert_at = rng.uniform_usize(enc[b].len() + 1);
    enc[b].insert(insert_at, task);
    enc
}

/// The "specific position supplied" variant of `random_move`: removes
/// the task at `(machine, index)` and reinserts it on a uniformly
/// chosen other machine.
pub fn random_move_at(
    encoding: &Encoding,
    machine: MachineId,
    index: usize,
    rng: &mut RngSource,
) -> Encoding {
    let mut enc = encoding.clone();
    let n = enc.len();
    if n < 2 || index >= enc[machine].len() {
        return enc;
    }
    let mut b = rng.uniform_usize(n);
    while b == machine {
        b = rng.uniform_usize(n);
    }
    let task = enc[machine].remove(index);
    let insert_at = rng.uniform_usize(enc[b].len() + 1);
    enc[b].insert(insert_at, task);
    enc
}

pub fn block_move(encoding: &Encoding, rng: &mut RngSource) -> Encoding {
    let n = encoding.len();
    let candidates: Vec<MachineId> = (0..n).filter(|&m| encoding[m].len() >= 2).collect();
    if candidates.is_empty() || n < 2 {
        return random_move(encoding, rng);
    }
    let mut enc = encoding.clone();
    let source = *rng.choose(&candidates).unwrap();
    let mut dest = rng.uniform_usize(n);
    while dest == source {
        dest = rng.uniform_usize(n);
    }
    let len = enc[source].len();
    let start = rng.uniform_usize(len);
    let end = start + 1 + rng.uniform_usize(len - start);
    let block: Vec<TaskId> = enc[source].drain(start..end).collect();
    let insert_at = rng.uniform_usize(enc[dest].len() + 1);
    for (i, t) in block.into_iter().enumerate() {
        enc[dest].insert(insert_at + i, t);
    }
    enc
}

pub fn intra_machine_swap(encoding: &Encoding, rng: &mut RngSource) -> Encoding {
    let mut enc = encoding.clone();
    let candidates: Vec<MachineId> = (0..enc.len()).filter(|&m| enc[m].len() >= 2).collect();
    let Some(&m) = rng.choose(&candidates) else {
        return enc;
    };
    let len = enc[m].len();
    let i = rng.uniform_usize(len);
    let mut j = rng.uniform_usize(len);
    while j == i {
        j = rng.uniform_usize(len);
    }
    enc[m].swap(i, j);
    enc
}

pub fn inter_machine_swap(encoding: &Encoding, rng: &mut RngSource) -> Encoding {
    let mut enc = encoding.clone();
    let candidates: Vec<MachineId> = (0..enc.len()).filter(|&m| !enc[m].is_empty()).collect();
    if candidates.len() < 2 {
        return enc;
    }
    let a = *rng.choose(&candidates).unwrap();
    let mut b = *rng.choose(&candidates).unwrap();
    while b == a {
        b = *rng.choose(&candidates).unwrap();
    }
    let i = rng.uniform_usize(enc[a].len());
    let j = rng.uniform_usize(enc[b].len());
    let ta = enc[a][i];
    let tb = enc[b][j];
    enc[a][i] = tb;
    enc[b][j] = ta;
    enc
}

pub fn shuffle_machine(encoding: &Encoding, k: usize, rng: &mut RngSource) -> Encoding {
    let mut enc = encoding.clone();
    let n = enc.len();
    if n == 0 {
        return enc;
    }
    let k = k.min(n);
    for m in rng.choose_k_distinct(n, k) {
        rng.shuffle_in_place(&mut enc[m]);
    }
    enc
}

pub fn regenerate(problem: &Problem, rng: &mut RngSource) -> Encoding {
    let n_machines = problem.n_machines();
    let mut enc = vec![Vec::new(); n_machines];
    if n_machines == 0 {
        return enc;
    }
    let mut perm: Vec<TaskId> = (0..problem.n_tasks()).collect();
    rng.shuffle_in_place(&mut perm);
    for (i, t) in perm.into_iter().enumerate() {
        enc[i % n_machines].push(t);
    }
    enc
}

pub fn lookahead_insertion(
    encoding: &Encoding,
    attempts: usize,
    rng: &mut RngSource,
    ctx: &MoveContext,
) -> Encoding {
    let baseline = score(ctx.problem, encoding, ctx.weights);
    for _ in 0..attempts {
        let candidate = random_move(encoding, rng);
        let candidate_cost = score(ctx.problem, &candidate, ctx.weights);
        if candidate_cost.total < baseline.total {
            return candidate;
        }
    }
    encoding.clone()
}

/// For each precedence `a ≺ b` landing on the same machine out of
/// order, moves `a` to immediately before `b`. Cross-machine violations
/// are left to the penalty term. Idempotent: a second application finds
/// every pair already in order and is a no-op.
///
/// A single forward pass over the precedence map does not reach a
/// fixpoint when same-machine precedences chain (`a ≺ b ≺ c`): fixing
/// one pair can reopen another pair earlier or later in the sequence.
/// Repeat passes until one makes no move; acyclic precedences
/// (guaranteed by `Problem` construction) always reach that fixpoint,
/// bounded here by `n_tasks + 1` passes as a defensive cap.
pub fn partial_precedence_repair(encoding: &Encoding, problem: &Problem) -> Encoding {
    let mut enc = encoding.clone();
    if !problem.has_precedences() {
        return enc;
    }
    for _ in 0..=problem.n_tasks() {
        let mut moved = false;
        for (&b, preds) in problem.precedences() {
            for &a in preds {
                if let (Some((ma, ia)), Some((mb, ib))) =
                    (position_of(&enc, a), position_of(&enc, b))
                {
                    if ma == mb && ia > ib {
                        let task = enc[ma].remove(ia);
                        let new_b_idx = enc[mb]
                            .iter()
                            .position(|&x| x == b)
                            .expect("b was just located on this machine");
                        enc[mb].insert(new_b_idx, task);
                        moved = true;
                    }
                }
            }
        }
        if !moved {
            break;
        }
    }
    enc
}

fn position_of(encoding: &Encoding, task: TaskId) -> Option<(MachineId, usize)> {
    for (m, seq) in encoding.iter().enumerate() {
        if let Some(i) = seq.iter().position(|&t| t == task) {
            return Some((m, i));
        }
    }
    None
}
