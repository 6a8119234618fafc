mod common;

use std::sync::{Arc, Mutex};

use drizzle_web3_core::{
    Action, ActionType, Dispatcher, Middleware, MiddlewareOutcome, PortError, Store,
    DEFAULT_BUS_CAPACITY,
};

use common::{delivered, types};

struct Recorder {
    name: &'static str,
    seen: Arc<Mutex<Vec<(String, ActionType)>>>,
    suppress: Option<ActionType>,
    emit_on: Option<(ActionType, Action)>,
}

impl Recorder {
    fn new(name: &'static str, seen: &Arc<Mutex<Vec<(String, ActionType)>>>) -> Self {
        Self {
            name,
            seen: Arc::clone(seen),
            suppress: None,
            emit_on: None,
        }
    }
}

impl Middleware for Recorder {
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle(&mut self, action: &Action, _dispatcher: &Dispatcher) -> MiddlewareOutcome {
        let ty = action.action_type();
        self.seen
            .lock()
            .expect("seen lock")
            .push((self.name.to_owned(), ty));
        let mut outcome = if self.suppress == Some(ty) {
            MiddlewareOutcome::suppress()
        } else {
            MiddlewareOutcome::next()
        };
        if let Some((trigger, emitted)) = &self.emit_on {
            if *trigger == ty {
                outcome = outcome.emit(emitted.clone());
            }
        }
        outcome
    }
}

#[test]
fn wire_names_are_stable() {
    let names: Vec<&str> = ActionType::ALL.iter().map(|t| t.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "WEB3_INITIALIZING",
            "WEB3_INITIALIZED",
            "WEB3_USER_DENIED",
            "WEB3_FAILED",
            "WEB3_NETWORK_FETCHING",
            "WEB3_NETWORK_FETCHED",
            "WEB3_NETWORK_FAILED",
            "NETWORK_ID_CHANGED",
            "ACCOUNTS_FETCHED",
            "ACCOUNTS_LISTENING",
            "DRIZZLE_INITIALIZING",
            "ADD_CONTRACT",
            "ERROR_ADD_CONTRACT",
        ]
    );
    assert_eq!(
        ActionType::parse("ERROR_ADD_CONTRACT"),
        Some(ActionType::ErrorAddContract)
    );
    assert_eq!(ActionType::parse("web3_initialized"), None);
}

#[test]
fn middleware_run_in_registration_order_and_can_suppress() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut first = Recorder::new("first", &seen);
    first.suppress = Some(ActionType::Web3UserDenied);
    let mut store = Store::new(DEFAULT_BUS_CAPACITY)
        .with_middleware(first)
        .with_middleware(Recorder::new("second", &seen));
    let mut rx = store.subscribe();

    store.dispatch(Action::Web3Initializing);
    store.dispatch(Action::Web3UserDenied);

    assert_eq!(
        *seen.lock().expect("seen lock"),
        vec![
            ("first".to_owned(), ActionType::Web3Initializing),
            ("second".to_owned(), ActionType::Web3Initializing),
            ("first".to_owned(), ActionType::Web3UserDenied),
        ]
    );
    assert_eq!(
        types(&delivered(&mut rx)),
        vec![ActionType::Web3Initializing]
    );
}

#[test]
fn emitted_actions_run_after_the_current_action() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut first = Recorder::new("first", &seen);
    first.emit_on = Some((ActionType::Web3Initializing, Action::AccountsListening));
    let mut store = Store::new(DEFAULT_BUS_CAPACITY)
        .with_middleware(first)
        .with_middleware(Recorder::new("second", &seen));
    let mut rx = store.subscribe();

    let processed = store.dispatch(Action::Web3Initializing);

    assert_eq!(processed, 2);
    assert_eq!(
        types(&delivered(&mut rx)),
        vec![ActionType::Web3Initializing, ActionType::AccountsListening]
    );
    assert_eq!(seen.lock().expect("seen lock")[1].1, ActionType::Web3Initializing);
}

#[test]
fn external_dispatches_are_processed_on_pump() {
    let mut store = Store::new(DEFAULT_BUS_CAPACITY);
    let mut rx = store.subscribe();
    let dispatcher = store.dispatcher();

    assert!(dispatcher.dispatch(Action::NetworkIdChanged { network_id: 1 }));
    assert!(dispatcher.dispatch(Action::AccountsListening));
    assert!(delivered(&mut rx).is_empty());

    assert_eq!(store.pump(), 2);
    assert_eq!(
        types(&delivered(&mut rx)),
        vec![ActionType::NetworkIdChanged, ActionType::AccountsListening]
    );
}

#[test]
fn dispatch_after_store_drop_reports_failure() {
    let store = Store::new(DEFAULT_BUS_CAPACITY);
    let dispatcher = store.dispatcher();
    drop(store);

    assert!(!dispatcher.dispatch(Action::Web3Initializing));
}

#[test]
fn failure_actions_carry_error_code_and_message() {
    let action = Action::Web3Failed {
        error: PortError::rpc(4001, "User rejected the request."),
    };

    assert_eq!(
        action.to_json(),
        serde_json::json!({
            "type": "WEB3_FAILED",
            "error": {
                "code": 4001,
                "message": "provider error 4001: User rejected the request."
            }
        })
    );
}

#[test]
fn default_outcome_lets_the_action_through() {
    let outcome = MiddlewareOutcome::default();

    assert!(outcome.propagate);
    assert!(outcome.emitted.is_empty());
}
