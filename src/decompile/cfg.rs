use std::collections::{BTreeMap, BTreeSet, VecDeque};

use rustc_hash::FxHashMap;

use crate::code_attribute::{Address, Code};

use super::error::{DecompileError, Result};
use super::java_ast::{LabelId, LabelTable};

/// Jump targets and reachability of one method's code.
#[derive(Debug)]
pub struct JumpTargets {
    /// Every address some branch can reach, with the label naming it.
    pub labels: BTreeMap<Address, LabelId>,
    /// Per instruction index: reachable from the entry point.
    pub reachable: Vec<bool>,
    index_of: FxHashMap<Address, usize>,
}

impl JumpTargets {
    pub fn label_at(&self, address: Address) -> Option<LabelId> {
        self.labels.get(&address).copied()
    }

    pub fn index_of(&self, address: Address) -> Option<usize> {
        self.index_of.get(&address).copied()
    }

    pub fn is_target(&self, address: Address) -> bool {
        self.labels.contains_key(&address)
    }
}

/// Collect branch targets, allocating one label per target address, and
/// mark the instructions reachable from the entry point.
///
/// Fails if a branch names an address with no instruction, or if reachable
/// code runs past the last instruction.
pub fn discover(code: &Code, labels: &mut LabelTable) -> Result<JumpTargets> {
    let instrs = &code.instructions;
    let index_of: FxHashMap<Address, usize> = instrs
        .iter()
        .enumerate()
        .map(|(i, ai)| (ai.address, i))
        .collect();

    // Step 1: branch targets
    let mut targets = BTreeSet::new();
    for ai in instrs {
        for target in ai.instruction.branch_targets() {
            if !index_of.contains_key(&target) {
                return Err(DecompileError::UnknownJumpTarget {
                    address: ai.address,
                    target,
                });
            }
            targets.insert(target);
        }
    }
    let labels_by_address = targets
        .into_iter()
        .map(|address| (address, labels.fresh()))
        .collect();

    // Step 2: reachability
    let mut reachable = vec![false; instrs.len()];
    let mut work = VecDeque::new();
    if !instrs.is_empty() {
        work.push_back(0usize);
    }
    while let Some(idx) = work.pop_front() {
        if reachable[idx] {
            continue;
        }
        reachable[idx] = true;
        let instr = &instrs[idx].instruction;
        for target in instr.branch_targets() {
            if let Some(&t) = index_of.get(&target) {
                work.push_back(t);
            }
        }
        if !instr.ends_flow() {
            if idx + 1 >= instrs.len() {
                return Err(DecompileError::FellOffEnd);
            }
            work.push_back(idx + 1);
        }
    }

    Ok(JumpTargets {
        labels: labels_by_address,
        reachable,
        index_of,
    })
}
