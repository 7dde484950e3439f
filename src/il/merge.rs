use std::collections::HashSet;

use crate::{ext::OrderedHashMap, prelude::*, types::TypeSystem};

use super::{IrContext, NodeId};

/// The values bound to source variables at some point in a method body. Mainly used for
/// calculating the ɸ-functions at a merge point.
#[derive(Debug, Clone, Default)]
pub struct Variables(OrderedHashMap<String, NodeId>);
impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable to the node holding its current value.
    pub fn assign<S: Into<String>>(&mut self, variable: S, value: NodeId) {
        self.0.insert(variable.into(), value);
    }

    pub fn get(&self, variable: &str) -> Option<NodeId> {
        self.0.get(variable).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Determines the ɸ-functions needed where `branches` merge. For every variable assigned
    /// in at least one branch, there is one incoming value per branch: the branch's own
    /// assignment, or the value that was live before the split. Variables that have no value
    /// on some path are not merged.
    pub fn calculate_phi(&self, branches: &[Variables]) -> Vec<(String, Vec<NodeId>)> {
        let mut seen = HashSet::new();
        let mut phi_functions = vec![];

        for variable in branches.iter().flat_map(|b| b.0.keys()) {
            if !seen.insert(variable) {
                continue;
            }
            let incoming: Option<Vec<_>> = branches
                .iter()
                .map(|branch| branch.get(variable).or_else(|| self.get(variable)))
                .collect();

            match incoming {
                Some(values) => phi_functions.push((variable.clone(), values)),
                None => trace!("'{}' is not defined on every path, not merging", variable),
            }
        }

        phi_functions
    }
}

impl IrContext {
    /// Emit the ɸ-functions for `branches` merging at `join`, chained directly after it.
    /// Returns the bindings after the merge: `live`, updated with every merged variable.
    pub fn merge(
        &mut self,
        types: &dyn TypeSystem,
        join: NodeId,
        live: &Variables,
        branches: &[Variables],
    ) -> IrResult<Variables> {
        let mut after = live.clone();
        let mut cursor = join;
        for (variable, values) in live.calculate_phi(branches) {
            let phi = self.phi(types, Some(cursor), join, values)?;
            debug!("Merge '{}' at {} into {}", variable, join, phi);
            after.assign(variable, phi);
            cursor = phi;
        }
        Ok(after)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        il::{OperandKind, Value},
        testing::fixture,
        types::Modifiers,
    };

    use super::*;

    fn values(ctx: &mut IrContext, n: i32) -> Vec<NodeId> {
        let f = fixture();
        (0..n)
            .map(|i| ctx.literal(&f.table, None, Value::Int(i), Modifiers::NONE).unwrap())
            .collect()
    }

    #[test]
    fn unassigned_branches_fall_back_to_the_live_value() {
        let mut ctx = IrContext::new();
        let v = values(&mut ctx, 3);
        let mut live = Variables::new();
        live.assign("x", v[0]);
        let mut then_branch = Variables::new();
        then_branch.assign("x", v[1]);
        let else_branch = Variables::new();

        let phis = live.calculate_phi(&[then_branch, else_branch]);

        assert_eq!(vec![("x".to_string(), vec![v[1], v[0]])], phis);
    }

    #[test]
    fn variables_missing_on_some_path_are_not_merged() {
        let mut ctx = IrContext::new();
        let v = values(&mut ctx, 3);
        let live = Variables::new();
        let mut then_branch = Variables::new();
        then_branch.assign("tmp", v[0]);
        then_branch.assign("y", v[1]);
        let mut else_branch = Variables::new();
        else_branch.assign("y", v[2]);

        let phis = live.calculate_phi(&[then_branch, else_branch]);

        assert_eq!(vec![("y".to_string(), vec![v[1], v[2]])], phis);
    }

    #[test]
    fn variables_keep_their_first_assignment_order() {
        let mut ctx = IrContext::new();
        let v = values(&mut ctx, 3);
        let mut vars = Variables::new();
        vars.assign("b", v[0]);
        vars.assign("a", v[1]);
        vars.assign("b", v[2]);

        assert_eq!(2, vars.len());
        assert_eq!(Some(v[2]), vars.get("b"));
        let phis = Variables::new().calculate_phi(&[vars.clone(), vars]);
        let names: Vec<_> = phis.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(vec!["b", "a"], names);
    }

    #[test]
    fn merge_chains_phis_after_the_join() -> anyhow::Result<()> {
        let f = fixture();
        let mut ctx = IrContext::new();
        let entry = ctx.literal(&f.table, None, Value::Int(0), Modifiers::NONE)?;
        let join = ctx.join(None)?;
        let branch = ctx.goto(Some(entry), join)?;
        let other = ctx.literal(&f.table, Some(branch), Value::Int(1), Modifiers::NONE)?;
        ctx.insert_after(other, join)?;

        let mut live = Variables::new();
        live.assign("x", entry);
        live.assign("unchanged", entry);
        let mut taken = Variables::new();
        taken.assign("y", entry);
        taken.assign("x", entry);
        let mut fell_through = Variables::new();
        fell_through.assign("y", other);
        fell_through.assign("x", other);

        let after = ctx.merge(&f.table, join, &live, &[taken, fell_through])?;

        let y = after.get("y").unwrap();
        let x = after.get("x").unwrap();
        assert_eq!(Some(y), ctx.next(join));
        assert_eq!(Some(x), ctx.next(y));
        assert_eq!(Some(entry), after.get("unchanged"));
        match &ctx.operand(x)?.kind {
            OperandKind::Phi(phi) => {
                assert_eq!(join, phi.join);
                assert_eq!(vec![entry, other], phi.values);
            }
            other => panic!("expected a phi, found {}", other),
        }
        Ok(())
    }
}
