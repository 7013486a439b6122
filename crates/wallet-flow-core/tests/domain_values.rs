use wallet_flow_core::{
    AuthenticationType, GateSettings, InvocationId, LockState, PanelContent, Secret,
    WorkflowRequest,
};

#[test]
fn gate_settings_deserialize_from_config_json() {
    let json = r#"{
        "authentication_type": "ManualPin4",
        "lock_after_background": false,
        "max_attempts": 5
    }"#;
    let settings: GateSettings = serde_json::from_str(json).expect("parse settings");
    assert_eq!(settings.authentication_type, AuthenticationType::ManualPin4);
    assert!(!settings.lock_after_background);
    assert_eq!(settings.max_attempts, 5);
}

#[test]
fn lock_state_serializes_for_observers() {
    let state = LockState {
        is_locked: true,
        authentication_type: AuthenticationType::Biometric,
    };
    let value = serde_json::to_value(state).expect("serialize lock state");
    assert_eq!(value["is_locked"], true);
    assert_eq!(value["authentication_type"], "Biometric");
}

#[test]
fn secret_never_prints() {
    let secret = Secret::new("abandon abandon about");
    assert_eq!(format!("{secret:?}"), "Secret(<redacted>)");
    assert_eq!(secret.expose(), "abandon abandon about");
}

#[test]
fn pin_methods_report_their_length() {
    let lengths: Vec<_> = AuthenticationType::ALL
        .iter()
        .map(|m| m.pin_length())
        .collect();
    assert_eq!(lengths, vec![None, None, Some(4), Some(6), None]);
    assert!(AuthenticationType::Biometric.is_device_backed());
    assert!(!AuthenticationType::ManualPin6.is_device_backed());
    assert!(!AuthenticationType::None.is_gated());
}

#[test]
fn request_defaults_match_wallet_copy() {
    let request = WorkflowRequest::new("Send").row("To", "xN1abc");
    assert_eq!(request.ticker, "xNAV");
    assert_eq!(request.building_label, "Creating transaction...");
    assert_eq!(request.broadcasting_label, "Broadcasting...");
    assert_eq!(request.swipe_title, "Swipe to confirm");
    assert_eq!(request.rows.len(), 1);
    assert_eq!(request.rows[0].label, "To");
}

#[test]
fn review_panel_carries_its_invocation() {
    let panel = PanelContent::Review {
        invocation: InvocationId(7),
        title: "Send".to_owned(),
        rows: vec![],
        fee: "0.00001 xNAV".to_owned(),
        swipe_title: "Swipe to confirm".to_owned(),
    };
    let value = serde_json::to_value(&panel).expect("serialize panel");
    assert_eq!(value["Review"]["invocation"], 7);
    assert_eq!(InvocationId(7).to_string(), "inv-7");
}
