use super::BlockTaskContext;
use crate::error::Result;
use crate::services::DynamicGlobalPropertyService;
use crate::virtual_ops::VirtualOperation;

/// Switch to the rule set scheduled for the current block, if any.
pub fn process_hardforks(ctx: &mut BlockTaskContext<'_>) -> Result<()> {
    let current = ctx.db.dynamic_global_properties()?.hardfork;
    let scheduled = ctx.db.config.hardfork_at(current, ctx.block().block_num);
    if scheduled <= current {
        return Ok(());
    }
    ctx.db
        .update_dynamic_global_properties(|p| p.hardfork = scheduled)?;
    tracing::info!(from = %current, to = %scheduled, "hardfork applied");
    ctx.push_virtual_operation(VirtualOperation::Hardfork {
        hardfork: scheduled,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_tasks::BlockInfo;
    use crate::config::{ChainConfig, HardforkActivation};
    use crate::testing::ChainStateBuilder;
    use crate::types::Hardfork;

    #[test]
    fn hardfork_is_applied_once() {
        let config = ChainConfig {
            hardforks: vec![HardforkActivation {
                hardfork: Hardfork::HARDFORK_0_1,
                block_num: 5,
            }],
            ..ChainConfig::testnet()
        };
        let mut state = ChainStateBuilder::new().with_config(config).build().unwrap();
        let db = state.database_mut();

        let mut vops = Vec::new();
        for block_num in 4..7 {
            let block = BlockInfo {
                block_num,
                timestamp: db.head_block_time().unwrap(),
                witness: "alice".parse().unwrap(),
            };
            process_hardforks(&mut BlockTaskContext::new(db, &block, &mut vops)).unwrap();
        }
        assert_eq!(
            vops,
            vec![VirtualOperation::Hardfork {
                hardfork: Hardfork::HARDFORK_0_1
            }]
        );
        assert!(db.has_hardfork(Hardfork::HARDFORK_0_1).unwrap());
        assert!(!db.has_hardfork(Hardfork::HARDFORK_0_2).unwrap());
    }
}
