use ckb_logger::{debug, info};
use ckb_types::prelude::*;
use crowdfunding_utils::{
    amount_from_data, check_deadline, get_project_args, get_script_status, hash32, CellLoader,
    ClaimArgs, ContributionArgs, Error, NetworkConfig, ProjectArgs, QueryIter, Result,
    ScriptStatus, Source, VmArgs,
};

use crate::ContributionFilter;

fn claim_amount<L: CellLoader + ?Sized>(
    loader: &L,
    index: usize,
    source: Source,
) -> Option<Result<u128>> {
    let data = loader.load_cell_data(index, source)?;
    Some(amount_from_data(&data).ok_or(Error::InvalidCellData(data.len())))
}

/// A claim is minted together with exactly one contribution of the same
/// project, and records its capacity as the claimable amount.
fn check_contribution<L: CellLoader + ?Sized>(
    loader: &L,
    config: &NetworkConfig,
    args: &ClaimArgs,
    project: &ProjectArgs,
) -> Result<()> {
    if loader.load_cell(1, Source::GroupOutput).is_some() {
        return Err(Error::ClaimDuplicated);
    }

    let filter = ContributionFilter {
        config,
        script: project.contribution_script,
        project_hash: args.project_script_hash,
        deadline: project.deadline,
        contribution_type: project.contribution_type,
    };

    let mut contribution: Option<u64> = None;
    for capacity in QueryIter::new(loader, |l, i, s| filter.capacity(l, i, s), Source::Output) {
        if let Some(capacity) = capacity? {
            if contribution.is_some() {
                return Err(Error::ContributionDuplicated);
            }
            contribution = Some(capacity);
        }
    }

    let amount = claim_amount(loader, 0, Source::GroupOutput)
        .ok_or(Error::InvalidCellData(0))??;
    if contribution.map(u128::from) != Some(amount) {
        return Err(Error::ClaimAmount {
            capacity: contribution,
            amount,
        });
    }
    Ok(())
}

fn donation<L: CellLoader + ?Sized>(
    loader: &L,
    config: &NetworkConfig,
    vm: &VmArgs,
    args: &ClaimArgs,
) -> Result<()> {
    info!("Donation, create claim");

    let project = get_project_args(loader, &args.project_script_hash, Source::CellDep)?
        .ok_or(Error::ProjectNotFound)?;
    if project.deadline != args.deadline {
        return Err(Error::DeadlineMismatch);
    }
    if vm.script != project.claim_script {
        return Err(Error::ScriptNotInProject);
    }

    check_contribution(loader, config, args, &project)
}

/// After the deadline every claim of this group is burnt, and the backer
/// receives at least the claimed amount plus the claim cells' own capacity.
fn refund<L: CellLoader + ?Sized>(
    loader: &L,
    config: &NetworkConfig,
    args: &ClaimArgs,
) -> Result<()> {
    info!("Refund");

    let contribution_script = config.contribution.script_ref();
    let contribution_total: u128 = QueryIter::new(
        loader,
        |l, i, s| {
            let lock = l.load_cell_lock(i, s)?;
            let matched = config
                .vm_args(&lock)
                .filter(|vm| vm.script == contribution_script)
                .and_then(|vm| vm.inner::<ContributionArgs>().ok())
                .map_or(false, |contribution| {
                    contribution.project_script_hash == args.project_script_hash
                });
            if matched {
                Some(l.load_cell_capacity(i, s))
            } else {
                Some(None)
            }
        },
        Source::Input,
    )
    .flatten()
    .map(u128::from)
    .sum();

    if contribution_total == 0 {
        debug!("no contribution consumed, claim cells are dropped");
        return Ok(());
    }

    let mut claim_total: u128 = 0;
    for amount in QueryIter::new(loader, |l, i, s| claim_amount(l, i, s), Source::GroupInput) {
        claim_total = claim_total
            .checked_add(amount?)
            .ok_or(Error::AmountOverflow)?;
    }

    if contribution_total < claim_total {
        return Err(Error::InsufficientRefund {
            need: claim_total,
            actual: contribution_total,
        });
    }

    for capacity in QueryIter::new(loader, |l, i, s| l.load_cell_capacity(i, s), Source::GroupInput) {
        claim_total = claim_total
            .checked_add(u128::from(capacity))
            .ok_or(Error::AmountOverflow)?;
    }

    let backer_capacity: u128 = QueryIter::new(
        loader,
        |l, i, s| {
            let lock_hash = l.load_cell_lock_hash(i, s)?;
            if lock_hash.as_slice() == args.backer_lock_script {
                Some(l.load_cell_capacity(i, s))
            } else {
                Some(None)
            }
        },
        Source::Output,
    )
    .flatten()
    .map(u128::from)
    .sum();

    if backer_capacity == 0 {
        return Err(Error::BackerNotFound);
    }
    if claim_total > backer_capacity {
        return Err(Error::RefundTooSmall {
            need: claim_total,
            actual: backer_capacity,
        });
    }
    Ok(())
}

pub fn main<L: CellLoader + ?Sized>(loader: &L, config: &NetworkConfig) -> Result<()> {
    debug!("Claim Script");

    let status = get_script_status(loader)?;
    let vm = VmArgs::parse(&loader.load_script().args().raw_data())?;
    let args: ClaimArgs = vm.inner()?;

    if check_deadline(loader, &args.deadline)? {
        match status {
            ScriptStatus::Created => donation(loader, config, &vm, &args),
            _ => Err(Error::ClaimTransaction),
        }
    } else {
        match status {
            ScriptStatus::Destroyed => refund(loader, config, &args),
            ScriptStatus::Transaction => Err(Error::ClaimTransaction),
            ScriptStatus::Created => {
                debug!(
                    "claim {:x?} created after the deadline",
                    hash32(&loader.load_script_hash())
                );
                Err(Error::ClaimExpired)
            }
        }
    }
}
