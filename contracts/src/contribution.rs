use ckb_logger::{debug, info};
use ckb_types::prelude::*;
use crowdfunding_utils::{
    check_deadline, get_project_args, option_bytes_eq, CellLoader, ContributionArgs, Error,
    Hash32, NetworkConfig, ProjectArgs, QueryIter, Result, Source, VmArgs,
};

fn type_matches(type_hash: Option<&[u8]>, expected: &Option<Hash32>) -> bool {
    option_bytes_eq(type_hash, expected.as_ref().map(|hash| &hash[..]))
}

/// The project is consumed in this transaction, so every contribution cell
/// must be consumed with it.
fn success<L: CellLoader + ?Sized>(loader: &L) -> Result<()> {
    info!("Crowdfunding Success");

    let this_script_hash = loader.load_script_hash();
    let recreated = QueryIter::new(loader, |l, i, s| l.load_cell_lock_hash(i, s), Source::Output)
        .any(|lock_hash| lock_hash == this_script_hash);
    if recreated {
        return Err(Error::ContributionNotDestroyed);
    }
    Ok(())
}

/// Folds every cell of this group into exactly one output with the same
/// lock, the same type and the same total capacity.
fn merge<L: CellLoader + ?Sized>(loader: &L, project: &ProjectArgs) -> Result<()> {
    info!("Merge Cell");

    let this_script_hash = loader.load_script_hash();

    let input_capacity: u128 = QueryIter::new(
        loader,
        |l, i, s| l.load_cell_capacity(i, s),
        Source::GroupInput,
    )
    .map(u128::from)
    .sum();

    for type_hash in QueryIter::new(loader, |l, i, s| l.load_cell_type_hash(i, s), Source::GroupInput) {
        if !type_matches(
            type_hash.as_ref().map(|hash| hash.as_slice()),
            &project.contribution_type,
        ) {
            return Err(Error::InputType);
        }
    }

    let mut output_capacity: Option<u128> = None;
    let mut index = 0;
    while let Some(lock_hash) = loader.load_cell_lock_hash(index, Source::Output) {
        if lock_hash == this_script_hash {
            if output_capacity.is_some() {
                return Err(Error::MergeOutputDuplicated);
            }
            let capacity = loader
                .load_cell_capacity(index, Source::Output)
                .unwrap_or_default();
            output_capacity = Some(u128::from(capacity));

            let type_hash = loader
                .load_cell_type_hash(index, Source::Output)
                .flatten();
            if !type_matches(
                type_hash.as_ref().map(|hash| hash.as_slice()),
                &project.contribution_type,
            ) {
                return Err(Error::OutputType);
            }
        }
        index += 1;
    }

    let output_capacity = output_capacity.unwrap_or_default();
    if input_capacity != output_capacity {
        return Err(Error::MergeCapacity {
            input: input_capacity,
            output: output_capacity,
        });
    }
    Ok(())
}

/// Locates the project this contribution belongs to, first among the cell
/// deps, then among the inputs. The flag is `true` for a cell dep.
fn check_project_cell<L: CellLoader + ?Sized>(
    loader: &L,
    vm: &VmArgs,
    args: &ContributionArgs,
) -> Result<(ProjectArgs, bool)> {
    let (project, in_cell_deps) =
        match get_project_args(loader, &args.project_script_hash, Source::CellDep)? {
            Some(project) => (project, true),
            None => match get_project_args(loader, &args.project_script_hash, Source::Input)? {
                Some(project) => (project, false),
                None => return Err(Error::ProjectNotFound),
            },
        };

    if args.deadline != project.deadline {
        return Err(Error::DeadlineMismatch);
    }
    if vm.script != project.contribution_script || args.claim_script != project.claim_script {
        return Err(Error::ScriptNotInProject);
    }

    Ok((project, in_cell_deps))
}

pub fn main<L: CellLoader + ?Sized>(loader: &L, _config: &NetworkConfig) -> Result<()> {
    debug!("Contribution Script");

    let vm = VmArgs::parse(&loader.load_script().args().raw_data())?;
    let args: ContributionArgs = vm.inner()?;

    if !check_deadline(loader, &args.deadline)? {
        // refunds are guarded by the claim script
        debug!("deadline timeout, project {:x?}", args.project_script_hash);
        return Ok(());
    }

    let (project, in_cell_deps) = check_project_cell(loader, &vm, &args)?;
    if in_cell_deps {
        merge(loader, &project)
    } else {
        success(loader)
    }
}
