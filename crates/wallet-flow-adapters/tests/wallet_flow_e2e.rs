mod common;

use wallet_flow_adapters::{
    decode_share_payload, InMemoryWallet, PromptResponse, SurfaceEvent, WalletAction,
};
use wallet_flow_core::{
    Amount, FailedStage, PanelContent, StageError, WorkflowOutcome, WorkflowStage,
};

use common::{answer, spending_secret, swipe_through, wait_for_review, wallet, PIN};

fn assert_overlays_exclusive(events: &[SurfaceEvent]) {
    let (mut busy, mut panel) = (false, false);
    for event in events {
        match event {
            SurfaceEvent::ShowBusy(_) | SurfaceEvent::UpdateBusy(_) => busy = true,
            SurfaceEvent::HideBusy => busy = false,
            SurfaceEvent::Mount(_) => panel = true,
            SurfaceEvent::Unmount => panel = false,
        }
        assert!(!(busy && panel), "busy and panel overlap: {events:?}");
    }
}

#[tokio::test]
async fn sell_order_ends_on_share_panel() {
    let mut w = wallet();
    let request = w
        .config
        .request("Confirm sell order")
        .row("Collection:", "Navio Punks")
        .row("Item:", "#7")
        .row("Price:", "1.5 xNAV");
    let action = WalletAction::SellOrder {
        collection_id: "c0ffee".to_owned(),
        nft_id: 7,
        price: Amount::parse_decimal("1.5").expect("price"),
        receive_to: "xNAVreceive".to_owned(),
    };
    let (builder, broadcaster) = (w.engine.clone(), w.engine.clone());

    let run = w
        .orch
        .execute(
            request,
            move |secret| async move { builder.build(&secret, action) },
            move |tx| async move { broadcaster.broadcast(tx) },
        )
        .expect("execute accepted");
    let task = tokio::spawn(run);

    answer(&mut w.prompts, PromptResponse::Pin(PIN.to_owned())).await;
    let id = wait_for_review(&w.orch).await;
    match w.orch.overlay().active_panel() {
        Some(PanelContent::Review { fee, rows, .. }) => {
            assert_eq!(fee, "0.00010000 xNAV");
            assert_eq!(rows.len(), 3);
        }
        other => panic!("expected review, got {other:?}"),
    }
    swipe_through(&w.orch, id);

    let receipt = match task.await.expect("join") {
        WorkflowOutcome::Succeeded { receipt, .. } => receipt,
        other => panic!("expected success, got {other:?}"),
    };
    assert!(receipt.txid.is_some());
    let Some(PanelContent::Share { payload, .. }) = w.orch.overlay().active_panel() else {
        panic!("share panel expected");
    };
    let order = decode_share_payload(&payload).expect("order payload");
    assert!(matches!(order.action, WalletAction::SellOrder { nft_id: 7, .. }));
    assert_eq!(w.engine.mempool().len(), 1);
    assert_eq!(w.engine.balance(), Amount::from_units(5 * 100_000_000 - 10_000));
    assert_overlays_exclusive(&w.surface.events());
}

#[tokio::test]
async fn insufficient_funds_fails_at_build() {
    let mut w = wallet();
    let poor = InMemoryWallet::new(
        spending_secret(),
        Amount::from_units(5_000),
        w.config.network_fee(),
    );
    let (builder, broadcaster) = (poor.clone(), poor.clone());
    let run = w
        .orch
        .execute(
            w.config.request("Confirm collection creation"),
            move |secret| async move {
                builder.build(
                    &secret,
                    WalletAction::CreateCollection {
                        name: "Navio Punks".to_owned(),
                        metadata: "{}".to_owned(),
                        supply: 1,
                    },
                )
            },
            move |tx| async move { broadcaster.broadcast(tx) },
        )
        .expect("execute accepted");
    let task = tokio::spawn(run);
    answer(&mut w.prompts, PromptResponse::Pin(PIN.to_owned())).await;

    let outcome = task.await.expect("join");
    assert!(matches!(
        outcome,
        WorkflowOutcome::Failed {
            stage: FailedStage::Building,
            error: StageError::Build(_),
            ..
        }
    ));
    assert_eq!(
        w.surface.events(),
        vec![
            SurfaceEvent::ShowBusy("Creating transaction...".to_owned()),
            SurfaceEvent::HideBusy,
            SurfaceEvent::Mount(PanelContent::Error {
                heading: "Unable to create transaction".to_owned(),
                message: "insufficient funds".to_owned(),
            }),
        ]
    );
    assert!(poor.mempool().is_empty());
}

#[tokio::test]
async fn node_rejection_is_shown_without_its_suffix() {
    let mut w = wallet();
    w.engine
        .reject_next_broadcast("bad-txns-inputs-missingorspent [code -25]");
    let (builder, broadcaster) = (w.engine.clone(), w.engine.clone());
    let run = w
        .orch
        .execute(
            w.config.request("Confirm collection creation"),
            move |secret| async move {
                builder.build(
                    &secret,
                    WalletAction::CreateCollection {
                        name: "Navio Punks".to_owned(),
                        metadata: r#"{"description":"pixel art"}"#.to_owned(),
                        supply: 100,
                    },
                )
            },
            move |tx| async move { broadcaster.broadcast(tx) },
        )
        .expect("execute accepted");
    let task = tokio::spawn(run);
    answer(&mut w.prompts, PromptResponse::Pin(PIN.to_owned())).await;
    let id = wait_for_review(&w.orch).await;
    swipe_through(&w.orch, id);

    let outcome = task.await.expect("join");
    assert!(matches!(
        outcome,
        WorkflowOutcome::Failed {
            stage: FailedStage::Broadcasting,
            ..
        }
    ));
    assert_eq!(
        w.orch.overlay().active_panel(),
        Some(PanelContent::Error {
            heading: "Unable to send transaction".to_owned(),
            message: "bad-txns-inputs-missingorspent".to_owned(),
        })
    );
    assert_eq!(w.engine.balance(), Amount::from_units(5 * 100_000_000));
    assert_overlays_exclusive(&w.surface.events());
}

#[tokio::test]
async fn cancelling_the_review_leaves_nothing_behind() {
    let mut w = wallet();
    let (builder, broadcaster) = (w.engine.clone(), w.engine.clone());
    let run = w
        .orch
        .execute(
            w.config.request("Confirm collection creation"),
            move |secret| async move {
                builder.build(
                    &secret,
                    WalletAction::CreateCollection {
                        name: "Navio Punks".to_owned(),
                        metadata: "{}".to_owned(),
                        supply: 1,
                    },
                )
            },
            move |tx| async move { broadcaster.broadcast(tx) },
        )
        .expect("execute accepted");
    let task = tokio::spawn(run);
    answer(&mut w.prompts, PromptResponse::Pin(PIN.to_owned())).await;
    let id = wait_for_review(&w.orch).await;

    w.orch.drag_update(id, 20.0).expect("partial drag");
    assert!(w.orch.cancel().await);
    assert!(matches!(
        task.await.expect("join"),
        WorkflowOutcome::Aborted { .. }
    ));
    assert_eq!(w.orch.stage(), WorkflowStage::Idle);
    assert!(w.orch.overlay().snapshot().is_empty());
    assert!(w.engine.mempool().is_empty());
    assert!(!w.orch.confirm(id));
}
