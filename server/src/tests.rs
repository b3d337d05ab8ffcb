use crate::{Service, Store};
use puglands_execution::mocks::create_account_keypair;
use puglands_types::{
    api::Update,
    economy::{AcquireMethod, LAND_COST, LAND_PPS, STARTING_BALANCE},
    execution::{Instruction, Transaction},
    EconomyError,
};
use std::{path::PathBuf, sync::Arc};

const T0: u64 = 1_700_000_000_000;

fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("puglands-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

async fn register(
    service: &Service,
    private: &commonware_cryptography::ed25519::PrivateKey,
    name: &str,
) {
    let tx = Transaction::sign(
        private,
        0,
        Instruction::Register {
            name: name.to_string(),
        },
    );
    service.submit(tx, T0).await.unwrap();
}

#[tokio::test]
async fn test_exclusive_ownership_under_contention() {
    let service = Arc::new(Service::new(None, Store::ephemeral()));

    let keypairs: Vec<_> = (0..8).map(create_account_keypair).collect();
    for (i, (private, _)) in keypairs.iter().enumerate() {
        register(&service, private, &format!("Player{}", i)).await;
    }

    // Everyone races for the same cell.
    let mut handles = Vec::new();
    for (private, _) in &keypairs {
        let service = service.clone();
        let tx = Transaction::sign(
            private,
            1,
            Instruction::AcquireLand {
                gx: 5,
                gy: 5,
                method: AcquireMethod::Buy,
            },
        );
        handles.push(tokio::spawn(async move { service.submit(tx, T0).await }));
    }

    let mut winners = Vec::new();
    let mut losses = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(receipt) => winners.push(receipt),
            Err(err) => {
                assert_eq!(err, EconomyError::AlreadyOwned { gx: 5, gy: 5 });
                losses += 1;
            }
        }
    }
    assert_eq!(winners.len(), 1);
    assert_eq!(losses, keypairs.len() - 1);

    // The ledger agrees with the single winner.
    let lands = service.all_lands().await;
    assert_eq!(lands.len(), 1);
    assert_eq!(lands[0].owner, winners[0].uid);
}

#[tokio::test]
async fn test_updates_published_after_commit() {
    let service = Arc::new(Service::new(None, Store::ephemeral()));
    let mut updates = service.update_subscriber();

    let (private, public) = create_account_keypair(1);
    register(&service, &private, "Alice").await;

    match updates.recv().await.unwrap() {
        Update::User { uid, user } => {
            assert_eq!(uid, public);
            assert_eq!(user.balance, STARTING_BALANCE);
        }
        update => panic!("expected user update, got {:?}", update),
    }

    let tx = Transaction::sign(
        &private,
        1,
        Instruction::AcquireLand {
            gx: 0,
            gy: 0,
            method: AcquireMethod::Buy,
        },
    );
    service.submit(tx, T0).await.unwrap();

    match updates.recv().await.unwrap() {
        Update::User { user, .. } => assert_eq!(user.land_count, 1),
        update => panic!("expected user update, got {:?}", update),
    }
    match updates.recv().await.unwrap() {
        Update::Lands { lands } => {
            assert_eq!(lands.len(), 1);
            assert_eq!((lands[0].gx, lands[0].gy), (0, 0));
            assert_eq!(lands[0].owner, public);
        }
        update => panic!("expected lands update, got {:?}", update),
    }
}

#[tokio::test]
async fn test_get_user_applies_accrual_idempotently() {
    let service = Arc::new(Service::new(None, Store::ephemeral()));
    let (private, public) = create_account_keypair(1);
    register(&service, &private, "Alice").await;

    let tx = Transaction::sign(
        &private,
        1,
        Instruction::AcquireLand {
            gx: 1,
            gy: 2,
            method: AcquireMethod::Buy,
        },
    );
    service.submit(tx, T0).await.unwrap();

    let later = T0 + 30_000;
    let first = service.get_user(&public, later).await.unwrap();
    assert_eq!(
        first.balance,
        STARTING_BALANCE - LAND_COST + 30 * LAND_PPS
    );

    // No wall-clock advance, no further income.
    let second = service.get_user(&public, later).await.unwrap();
    assert_eq!(second.balance, first.balance);

    let unknown = create_account_keypair(9).1;
    assert_eq!(
        service.get_user(&unknown, later).await.unwrap_err(),
        EconomyError::NotFound
    );
}

#[tokio::test]
async fn test_state_survives_restart() {
    let dir = test_dir("restart");
    let (private, public) = create_account_keypair(1);

    {
        let service = Service::new(None, Store::open(dir.clone()).unwrap());
        register(&service, &private, "Alice").await;
        let tx = Transaction::sign(
            &private,
            1,
            Instruction::AcquireLand {
                gx: 7,
                gy: 7,
                method: AcquireMethod::Buy,
            },
        );
        service.submit(tx, T0).await.unwrap();
    }

    // A fresh process sees the committed state, not a blank ledger.
    let service = Service::new(None, Store::open(dir.clone()).unwrap());
    let user = service.get_user(&public, T0).await.unwrap();
    assert_eq!(user.name, "Alice");
    assert_eq!(user.balance, STARTING_BALANCE - LAND_COST);
    assert_eq!(user.land_count, 1);

    let lands = service.user_lands(&public).await;
    assert_eq!(lands.len(), 1);
    assert_eq!((lands[0].gx, lands[0].gy), (7, 7));

    // Replay also restored replay protection.
    assert_eq!(service.account(&public).await.nonce, 2);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_tampered_transaction_is_rejected() {
    let service = Arc::new(Service::new(None, Store::ephemeral()));
    let (private, _) = create_account_keypair(1);

    let mut tx = Transaction::sign(
        &private,
        0,
        Instruction::Register {
            name: "Alice".to_string(),
        },
    );
    tx.nonce = 7;

    assert_eq!(
        service.submit(tx, T0).await.unwrap_err(),
        EconomyError::NotAuthenticated
    );
}

#[tokio::test]
async fn test_failed_submit_has_no_side_effects() {
    let service = Arc::new(Service::new(None, Store::ephemeral()));
    let (private, public) = create_account_keypair(1);
    register(&service, &private, "Alice").await;

    // Voucher acquisition without a voucher fails...
    let tx = Transaction::sign(
        &private,
        1,
        Instruction::AcquireLand {
            gx: 3,
            gy: 3,
            method: AcquireMethod::Voucher,
        },
    );
    assert_eq!(
        service.submit(tx, T0).await.unwrap_err(),
        EconomyError::InsufficientVouchers
    );

    // ...and consumed neither the nonce nor anything else.
    assert_eq!(service.account(&public).await.nonce, 1);
    assert!(service.all_lands().await.is_empty());

    let tx = Transaction::sign(
        &private,
        1,
        Instruction::AcquireLand {
            gx: 3,
            gy: 3,
            method: AcquireMethod::Buy,
        },
    );
    service.submit(tx, T0).await.unwrap();
    assert_eq!(service.account(&public).await.nonce, 2);
}
