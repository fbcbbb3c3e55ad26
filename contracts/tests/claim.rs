mod common;

use common::*;
use crowdfunding_utils::{Error, MockTransaction, ScriptKind};

fn donation(project: &Project, contributions: &[u64], claims: &[u128]) -> MockTransaction {
    let backer = user_lock(2);
    let mut builder = TxBuilder::new(before())
        .cell_dep(project.cell())
        .input(cell(10_000, backer.clone(), None));
    for capacity in contributions {
        builder = builder.output(project.contribution(*capacity));
    }
    for amount in claims {
        builder = builder.output_with_data(project.claim(200, &backer), amount_data(*amount));
    }
    builder.build()
}

#[test]
fn test_create_claim() {
    let project = Project::new(before());
    let cases: Vec<(Vec<u64>, Vec<u128>, Result<(), Error>)> = vec![
        (vec![1000], vec![1000], Ok(())),
        (
            vec![1000],
            vec![999],
            Err(Error::ClaimAmount {
                capacity: Some(1000),
                amount: 999,
            }),
        ),
        (
            vec![],
            vec![1000],
            Err(Error::ClaimAmount {
                capacity: None,
                amount: 1000,
            }),
        ),
        (
            vec![1000, 1000],
            vec![1000],
            Err(Error::ContributionDuplicated),
        ),
        (vec![1000], vec![1000, 1000], Err(Error::ClaimDuplicated)),
    ];

    for (i, (contributions, claims, expected)) in cases.into_iter().enumerate() {
        let mock = donation(&project, &contributions, &claims);
        let result = project.verify(&mock).map_err(|err| err.error);
        assert_eq!(result, expected, "case-{}", i);
    }
}

#[test]
fn test_create_claim_contribution_type() {
    let project = typed_project();
    let backer = user_lock(2);
    let cases: Vec<(Option<_>, Result<(), Error>)> = vec![
        (Some(token_type()), Ok(())),
        (None, Err(Error::ContributionType(0))),
        (Some(user_lock(8)), Err(Error::ContributionType(0))),
    ];

    for (i, (type_, expected)) in cases.into_iter().enumerate() {
        let mock = TxBuilder::new(before())
            .cell_dep(project.cell())
            .input(cell(10_000, backer.clone(), None))
            .output(project.typed_contribution(1000, type_))
            .output_with_data(project.claim(200, &backer), amount_data(1000))
            .build();
        let result = project.verify(&mock).map_err(|err| err.error);
        assert_eq!(result, expected, "case-{}", i);
    }
}

#[test]
fn test_create_claim_bad_data() {
    let project = Project::new(before());
    let backer = user_lock(2);
    let mock = TxBuilder::new(before())
        .cell_dep(project.cell())
        .input(cell(10_000, backer.clone(), None))
        .output(project.contribution(1000))
        .output_with_data(project.claim(200, &backer), vec![1u8; 8].into())
        .build();
    let err = project.verify(&mock).unwrap_err();
    assert_eq!(err.error, Error::InvalidCellData(8));
    assert_eq!(err.kind, Some(ScriptKind::Claim));
}

#[test]
fn test_create_claim_without_project() {
    let project = Project::new(before());
    let backer = user_lock(2);
    let mock = TxBuilder::new(before())
        .input(cell(10_000, backer.clone(), None))
        .output(project.contribution(1000))
        .output_with_data(project.claim(200, &backer), amount_data(1000))
        .build();
    let err = project.verify(&mock).unwrap_err();
    assert_eq!(err.error, Error::ProjectNotFound);
}

#[test]
fn test_create_claim_after_deadline() {
    let project = Project::new(before());
    let backer = user_lock(2);
    let mock = TxBuilder::new(after())
        .cell_dep(project.cell())
        .input(cell(10_000, backer.clone(), None))
        .output_with_data(project.claim(200, &backer), amount_data(1000))
        .build();
    let err = project.verify(&mock).unwrap_err();
    assert_eq!(err.error, Error::ClaimExpired);
}

#[test]
fn test_claim_transaction() {
    let project = Project::new(before());
    let backer = user_lock(2);
    for (i, since) in vec![before(), after()].into_iter().enumerate() {
        let mock = TxBuilder::new(since)
            .cell_dep(project.cell())
            .input_with_data(project.claim(200, &backer), amount_data(1000))
            .output_with_data(project.claim(200, &backer), amount_data(1000))
            .build();
        let err = project.verify(&mock).unwrap_err();
        assert_eq!(err.error, Error::ClaimTransaction, "case-{}", i);
    }
}

/// Burns a claim of 200 carried by a 1 shannon cell, against a contribution
/// of `contribution` shannons, paying `refund` to the backer.
fn refund(project: &Project, contribution: u64, refund: &[u64]) -> Result<(), Error> {
    let backer = user_lock(2);
    let mut builder = TxBuilder::new(after())
        .input(project.contribution(contribution))
        .input_with_data(project.claim(1, &backer), amount_data(200));
    for capacity in refund {
        builder = builder.output(cell(*capacity, backer.clone(), None));
    }
    builder = builder.output(cell(1000, user_lock(3), None));
    project.verify(&builder.build()).map_err(|err| err.error)
}

#[test]
fn test_refund() {
    let project = Project::new(before());
    let cases: Vec<(u64, Vec<u64>, Result<(), Error>)> = vec![
        (10_000, vec![201], Ok(())),
        (10_000, vec![10_000], Ok(())),
        (10_000, vec![101, 100], Ok(())),
        (
            10_000,
            vec![100],
            Err(Error::RefundTooSmall {
                need: 201,
                actual: 100,
            }),
        ),
        (10_000, vec![], Err(Error::BackerNotFound)),
        (
            100,
            vec![201],
            Err(Error::InsufficientRefund {
                need: 200,
                actual: 100,
            }),
        ),
    ];

    for (i, (contribution, backer, expected)) in cases.into_iter().enumerate() {
        assert_eq!(
            refund(&project, contribution, &backer),
            expected,
            "case-{}",
            i
        );
    }
}

#[test]
fn test_destroy_claim_without_contribution() {
    let project = Project::new(before());
    let backer = user_lock(2);
    let mock = TxBuilder::new(after())
        .input_with_data(project.claim(200, &backer), amount_data(1000))
        .output(cell(200, user_lock(3), None))
        .build();
    assert!(project.verify(&mock).is_ok());
}
