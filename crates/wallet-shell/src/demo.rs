//! Scripted session: a PIN pad that always answers, and a user who fills in
//! the screens and swipes through every review.

use std::future::Future;
use std::time::Duration;

use eyre::{bail, eyre, WrapErr};
use serde::Serialize;
use wallet_flow_adapters::{
    decode_share_payload, FlowAdapterConfig, InMemoryWallet, PromptHandle, PromptResponse, SecretVault,
    ServerEntry, WalletAction,
};
use wallet_flow_core::{
    Amount, AuthenticationType, InvocationId, PanelContent, Secret, WorkflowOutcome, WorkflowStage,
    UNITS_PER_COIN,
};

use crate::flow_bridge::FlowBridge;
use crate::screens::{
    AddServerScreen, CreateNftCollectionScreen, DeviceSupport, NftCollection, ScreenExit,
    SellNftScreen, SettingsScreen,
};

const DEMO_MNEMONIC: &str =
    "abandon ability able about above absent absorb abstract absurd abuse access accident";
const DEMO_RECEIVE_ADDRESS: &str = "xNAV1qdemoreceiveaddress";
const REVIEW_TIMEOUT: Duration = Duration::from_secs(30);

/// PIN the scripted user types for a PIN method.
pub fn demo_pin(method: AuthenticationType) -> Option<&'static str> {
    match method.pin_length()? {
        4 => Some("2468"),
        _ => Some("246810"),
    }
}

#[derive(Debug, Serialize)]
struct SessionReport {
    authentication: &'static str,
    servers: Vec<ServerEntry>,
    balance: String,
    sent: Vec<String>,
    share_payload: Option<String>,
    overlay_events: usize,
}

pub async fn run(config: FlowAdapterConfig) -> eyre::Result<()> {
    let method = config.authentication_type;
    let vault = SecretVault::new(config.kdf_params()).wrap_err("creating secret vault")?;
    vault
        .seal(&Secret::new(DEMO_MNEMONIC), method, demo_pin(method))
        .wrap_err("sealing demo wallet")?;
    let wallet = InMemoryWallet::new(
        Secret::new(DEMO_MNEMONIC),
        Amount::from_units(10 * UNITS_PER_COIN),
        config.network_fee(),
    );

    let (bridge, prompts) = FlowBridge::new(config, vault, wallet);
    let pin_pad = tokio::spawn(answer_prompts(prompts));

    let mut add_server = AddServerScreen::new("mainnet");
    add_server.host = "electrum.nav.community".to_owned();
    add_server.port = "40002".to_owned();
    add_server.select_proto(1);
    if add_server.submit(bridge.wallet()).is_none() {
        bail!("server rejected: {:?}", add_server.notice.last_error);
    }

    let mut create = CreateNftCollectionScreen {
        name: "Navio Punks".to_owned(),
        description: "Pixel art collection".to_owned(),
        amount: 100,
        ..CreateNftCollectionScreen::default()
    };
    let Some(run) = create.submit(&bridge) else {
        bail!("collection not started: {:?}", create.notice.last_error);
    };
    let outcome = swipe_through(&bridge, run).await?;
    tracing::info!(exit = ?ScreenExit::from_outcome(&outcome), "collection creation finished");
    let collection = created_collection(&bridge, &create.name)?;

    // A node rejection lands on the error panel and the screen stays put.
    bridge
        .wallet()
        .reject_next_broadcast("bad-txns-nft-exists [collection already registered]");
    if let Some(run) = create.submit(&bridge) {
        let outcome = swipe_through(&bridge, run).await?;
        if let Some(PanelContent::Error { heading, message }) = bridge.overlay().active_panel() {
            tracing::info!(%heading, %message, exit = ?ScreenExit::from_outcome(&outcome), "retry rejected");
        }
        bridge.overlay().dismiss_panel().await;
    }

    let mut sell = SellNftScreen::new(collection, 7, DEMO_RECEIVE_ADDRESS);
    sell.on_price_changed("1,5");
    let Some(run) = sell.submit(&bridge) else {
        bail!("sell order not started: {:?}", sell.notice.last_error);
    };
    let outcome = swipe_through(&bridge, run).await?;
    let share = match ScreenExit::from_outcome(&outcome) {
        ScreenExit::FollowUp(PanelContent::Share { payload, .. }) => Some(payload),
        exit => {
            tracing::warn!(?exit, "sell order did not reach the share panel");
            None
        }
    };
    if let Some(order) = share.as_deref().and_then(decode_share_payload) {
        tracing::info!(txid = %order.txid, "share payload decodes to the sell order");
    }
    bridge.overlay().dismiss_panel().await;

    let mut settings = SettingsScreen::new(device_support(method));
    if settings.auto_lock_visible(&bridge) {
        for _ in 0..2 {
            bridge.gate().on_background();
            let locked = bridge.gate().on_foreground();
            let auto_lock = bridge.gate().lock_after_background();
            tracing::info!(locked, auto_lock, "back from background");
            settings.toggle_auto_lock(&bridge);
        }
    }
    settings.open_method_picker(&bridge).await;
    if let Some(next) = settings
        .options(&bridge)
        .into_iter()
        .find(|option| option.pin_length().is_some())
    {
        if let Err(err) = settings.change_method(&bridge, next, demo_pin(next)).await {
            tracing::warn!(%err, "authentication method unchanged");
        }
    } else {
        bridge.overlay().dismiss_panel().await;
    }
    tracing::info!(notice = ?settings.notice, "settings updated");
    if let Some(mnemonic) = settings.show_mnemonic(&bridge).await {
        tracing::info!(words = mnemonic.expose().split_whitespace().count(), "mnemonic revealed");
    }

    bridge.gate().teardown();
    pin_pad.abort();

    let report = SessionReport {
        authentication: bridge.gate().lock_state().authentication_type.display_name(),
        servers: bridge.wallet().servers(),
        balance: bridge.wallet().balance().display_with(&bridge.config().coin_ticker),
        sent: bridge
            .wallet()
            .mempool()
            .into_iter()
            .map(|tx| tx.txid)
            .collect(),
        share_payload: share,
        overlay_events: bridge.overlay().surface().events().len(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// The demo device offers whichever device method the wallet was set up with.
fn device_support(method: AuthenticationType) -> DeviceSupport {
    match method {
        AuthenticationType::Biometric => DeviceSupport::Biometric,
        AuthenticationType::DeviceCredential => DeviceSupport::DeviceCredential,
        _ => DeviceSupport::Nothing,
    }
}

/// Answers every prompt: the PIN for PIN methods, approval otherwise.
async fn answer_prompts(mut prompts: PromptHandle) {
    while let Some(request) = prompts.next().await {
        tracing::debug!(method = ?request.method, attempt = request.attempt, "prompt shown");
        let response = match demo_pin(request.method) {
            Some(pin) => PromptResponse::Pin(pin.to_owned()),
            None => PromptResponse::Approve,
        };
        request.respond(response);
    }
}

/// Spawns the run, waits for its review panel, drags the thumb past the
/// threshold and returns the outcome.
pub(crate) async fn swipe_through<F>(bridge: &FlowBridge, run: F) -> eyre::Result<WorkflowOutcome>
where
    F: Future<Output = WorkflowOutcome> + Send + 'static,
{
    let task = tokio::spawn(run);
    let invocation = match tokio::time::timeout(REVIEW_TIMEOUT, wait_for_review(bridge)).await {
        Ok(Some(invocation)) => invocation,
        Ok(None) => return Ok(task.await?),
        Err(_) => {
            task.abort();
            bail!("review never presented, stuck at {:?}", bridge.orchestrator().stage());
        }
    };

    let orchestrator = bridge.orchestrator();
    let track = orchestrator
        .gesture_state(invocation)
        .ok_or_else(|| eyre!("gesture not mounted"))?
        .threshold;
    orchestrator.drag_update(invocation, track / 2.0);
    orchestrator.drag_update(invocation, track);
    orchestrator.drag_end(invocation);
    Ok(task.await?)
}

/// The review's invocation, or `None` once the run ended before review.
async fn wait_for_review(bridge: &FlowBridge) -> Option<InvocationId> {
    loop {
        let orchestrator = bridge.orchestrator();
        if orchestrator.stage() == WorkflowStage::AwaitingConfirm {
            if let Some(PanelContent::Review { invocation, .. }) = bridge.overlay().active_panel() {
                return Some(invocation);
            }
        }
        if orchestrator.active_invocation().is_none() {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

fn created_collection(bridge: &FlowBridge, name: &str) -> eyre::Result<NftCollection> {
    bridge
        .wallet()
        .mempool()
        .into_iter()
        .find_map(|tx| match tx.action {
            WalletAction::CreateCollection { name: created, .. } if created == name => {
                Some(NftCollection {
                    token_id: tx.txid,
                    name: created,
                })
            }
            _ => None,
        })
        .ok_or_else(|| eyre!("collection {name} not in mempool"))
}
