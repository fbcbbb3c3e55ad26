use ckb_logger::{debug, info};
use ckb_types::prelude::*;
use crowdfunding_utils::{
    check_deadline, check_type_id, get_script_status, CellLoader, Error, NetworkConfig,
    ProjectArgs, QueryIter, Result, ScriptStatus, Source, VmArgs, TYPE_ID_OFFSET,
};

use crate::ContributionFilter;

fn create(args: &ProjectArgs) -> Result<()> {
    info!("Create crowdfunding");

    if args.goal_amount == 0 {
        return Err(Error::ZeroGoal);
    }
    Ok(())
}

fn success<L: CellLoader + ?Sized>(
    loader: &L,
    config: &NetworkConfig,
    args: &ProjectArgs,
) -> Result<()> {
    info!("Crowdfunding success");

    let this_script_hash = loader.load_script_hash();
    let filter = ContributionFilter {
        config,
        script: args.contribution_script,
        project_hash: crowdfunding_utils::hash32(&this_script_hash),
        deadline: args.deadline,
        contribution_type: args.contribution_type,
    };

    let mut total_capacity: u128 = 0;
    for capacity in QueryIter::new(loader, |l, i, s| filter.capacity(l, i, s), Source::Input) {
        if let Some(capacity) = capacity? {
            total_capacity += u128::from(capacity);
        }
    }

    if args.goal_amount > total_capacity {
        return Err(Error::InsufficientFunds {
            need: args.goal_amount,
            actual: total_capacity,
        });
    }

    let transfers = QueryIter::new(
        loader,
        |l, i, s| {
            let lock_hash = l.load_cell_lock_hash(i, s)?;
            let capacity = l.load_cell_capacity(i, s)?;
            Some(
                lock_hash.as_slice() == args.creator_lock_script_hash
                    && u128::from(capacity) == total_capacity,
            )
        },
        Source::Output,
    )
    .filter(|matched| *matched)
    .count();

    if transfers != 1 {
        debug!("{} outputs carry the raised funds to the creator", transfers);
        return Err(Error::FundsNotTransferred);
    }
    Ok(())
}

fn fail<L: CellLoader + ?Sized>(loader: &L) -> Result<()> {
    info!("Crowdfunding failed, destroy project");

    let this_script_hash = loader.load_script_hash();
    let recreated = QueryIter::new(loader, |l, i, s| l.load_cell_type_hash(i, s), Source::Output)
        .any(|hash| hash.as_ref() == Some(&this_script_hash));
    if recreated {
        return Err(Error::ProjectRecreated);
    }
    Ok(())
}

pub fn main<L: CellLoader + ?Sized>(loader: &L, config: &NetworkConfig) -> Result<()> {
    debug!("Project Script");

    check_type_id(loader, TYPE_ID_OFFSET)?;
    let status = get_script_status(loader)?;
    let vm = VmArgs::parse(&loader.load_script().args().raw_data())?;
    let args: ProjectArgs = vm.inner()?;

    if check_deadline(loader, &args.deadline)? {
        match status {
            ScriptStatus::Created => create(&args),
            ScriptStatus::Destroyed => success(loader, config, &args),
            ScriptStatus::Transaction => Err(Error::ProjectTransaction),
        }
    } else {
        match status {
            ScriptStatus::Destroyed => fail(loader),
            ScriptStatus::Transaction => Err(Error::ProjectTransaction),
            ScriptStatus::Created => Err(Error::ProjectExpired),
        }
    }
}
