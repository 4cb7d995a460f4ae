mod common;

use anyhow::Result;
use common::{SEED_BALANCE, SEED_ID, memory_service, seeded_service};
use pocketbank::application::AppError;

#[tokio::test]
async fn test_seeded_scenario() -> Result<()> {
    let (service, account) = seeded_service().await?;
    assert_eq!(account.balance, 10000);

    let change = service.top_up(SEED_ID, 5000).await?;
    assert_eq!(change.previous_balance, 10000);
    assert_eq!(change.account.balance, 15000);
    assert_eq!(change.account.name, "John Doe");

    let err = service.withdraw(SEED_ID, 20000).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::InsufficientBalance {
            balance: 15000,
            requested: 20000,
            ..
        }
    ));
    assert_eq!(service.get_account(SEED_ID).await?.balance, 15000);

    let change = service.withdraw(SEED_ID, 15000).await?;
    assert_eq!(change.account.balance, 0);

    let err = service.get_account(99).await.unwrap_err();
    assert!(matches!(err, AppError::AccountNotFound(99)));

    Ok(())
}

#[tokio::test]
async fn test_top_up_adds_exact_amount() -> Result<()> {
    let (service, _) = seeded_service().await?;

    for amount in [1, 99, 12345, 1_000_000] {
        let before = service.get_account(SEED_ID).await?.balance;
        let change = service.top_up(SEED_ID, amount).await?;
        assert_eq!(change.account.balance, before + amount);
        assert_eq!(service.get_account(SEED_ID).await?.balance, before + amount);
    }

    Ok(())
}

#[tokio::test]
async fn test_top_up_leaves_other_accounts_alone() -> Result<()> {
    let (service, _) = seeded_service().await?;
    service.open_account(2, "Jane Roe", 4200).await?;

    service.top_up(SEED_ID, 5000).await?;
    service.withdraw(SEED_ID, 100).await?;

    assert_eq!(service.get_account(2).await?.balance, 4200);
    Ok(())
}

#[tokio::test]
async fn test_withdraw_subtracts_exact_amount() -> Result<()> {
    let (service, _) = seeded_service().await?;

    let change = service.withdraw(SEED_ID, 2550).await?;
    assert_eq!(change.previous_balance, SEED_BALANCE);
    assert_eq!(change.amount, 2550);
    assert_eq!(change.account.balance, SEED_BALANCE - 2550);

    Ok(())
}

#[tokio::test]
async fn test_withdraw_entire_balance() -> Result<()> {
    let (service, _) = seeded_service().await?;
    let change = service.withdraw(SEED_ID, SEED_BALANCE).await?;
    assert_eq!(change.account.balance, 0);
    Ok(())
}

#[tokio::test]
async fn test_insufficient_balance_is_repeatable_and_changes_nothing() -> Result<()> {
    let (service, _) = seeded_service().await?;

    for _ in 0..3 {
        let err = service.withdraw(SEED_ID, SEED_BALANCE + 1).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientBalance { .. }));
        assert_eq!(service.get_account(SEED_ID).await?.balance, SEED_BALANCE);
    }

    Ok(())
}

#[tokio::test]
async fn test_unknown_account_changes_nothing() -> Result<()> {
    let (service, _) = seeded_service().await?;

    assert!(matches!(
        service.top_up(99, 5000).await,
        Err(AppError::AccountNotFound(99))
    ));
    assert!(matches!(
        service.withdraw(99, 5000).await,
        Err(AppError::AccountNotFound(99))
    ));
    assert!(matches!(
        service.get_account(99).await,
        Err(AppError::AccountNotFound(99))
    ));

    assert_eq!(service.get_account(SEED_ID).await?.balance, SEED_BALANCE);
    Ok(())
}

#[tokio::test]
async fn test_top_up_then_withdraw_restores_balance() -> Result<()> {
    let (service, _) = seeded_service().await?;

    for amount in [1, 333, 10000, 987654] {
        service.top_up(SEED_ID, amount).await?;
        service.withdraw(SEED_ID, amount).await?;
        assert_eq!(service.get_account(SEED_ID).await?.balance, SEED_BALANCE);
    }

    Ok(())
}

#[tokio::test]
async fn test_non_positive_amounts_rejected() -> Result<()> {
    let (service, _) = seeded_service().await?;

    for amount in [0, -1, -5000] {
        assert!(matches!(
            service.top_up(SEED_ID, amount).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            service.withdraw(SEED_ID, amount).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    assert_eq!(service.get_account(SEED_ID).await?.balance, SEED_BALANCE);
    Ok(())
}

#[tokio::test]
async fn test_amount_validated_before_lookup() -> Result<()> {
    let service = memory_service().await?;
    assert!(matches!(
        service.top_up(99, -1).await,
        Err(AppError::InvalidInput(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_top_up_overflow_rejected() -> Result<()> {
    let service = memory_service().await?;
    service.open_account(5, "Whale", i64::MAX - 10).await?;

    assert!(matches!(
        service.top_up(5, 11).await,
        Err(AppError::InvalidInput(_))
    ));
    assert_eq!(service.get_account(5).await?.balance, i64::MAX - 10);
    Ok(())
}

#[tokio::test]
async fn test_open_account_validation() -> Result<()> {
    let (service, _) = seeded_service().await?;

    assert!(matches!(
        service.open_account(SEED_ID, "Someone Else", 0).await,
        Err(AppError::AccountAlreadyExists(1))
    ));
    assert!(matches!(
        service.open_account(2, "   ", 0).await,
        Err(AppError::InvalidInput(_))
    ));
    assert!(matches!(
        service.open_account(2, "Jane Roe", -100).await,
        Err(AppError::InvalidInput(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_ensure_account_keeps_existing_state() -> Result<()> {
    let (service, _) = seeded_service().await?;
    service.top_up(SEED_ID, 5000).await?;

    let account = service.ensure_account(SEED_ID, "Other Name", 0).await?;
    assert_eq!(account.name, "John Doe");
    assert_eq!(account.balance, 15000);

    let fresh = service.ensure_account(7, "Jane Roe", 2500).await?;
    assert_eq!(fresh.balance, 2500);
    Ok(())
}

#[tokio::test]
async fn test_operations_after_close_report_storage_error() -> Result<()> {
    let (service, _) = seeded_service().await?;
    service.close().await;

    assert!(matches!(
        service.top_up(SEED_ID, 100).await,
        Err(AppError::Storage(_))
    ));
    assert!(matches!(
        service.withdraw(SEED_ID, 100).await,
        Err(AppError::Storage(_))
    ));
    assert!(matches!(
        service.get_account(SEED_ID).await,
        Err(AppError::Storage(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_updated_at_moves_on_change() -> Result<()> {
    let (service, account) = seeded_service().await?;
    let change = service.top_up(SEED_ID, 100).await?;

    assert!(change.account.updated_at >= account.updated_at);
    assert_eq!(change.account.created_at, account.created_at);
    Ok(())
}
