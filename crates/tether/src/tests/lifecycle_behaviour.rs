//! Behavioural tests for request-scoped connections.

use std::cell::RefCell;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::error::RequestError;
use crate::lifecycle::{ConnectPolicy, Connection, RequestHooks};
use crate::reporter::StructuredLifecycleReporter;
use crate::transport::TransportHandle;
use crate::transport::test_support::{LoopbackProbe, LoopbackTransport};

struct LifecycleWorld {
    connection: Connection,
    probe: LoopbackProbe,
    policy: ConnectPolicy,
    outcome: Option<Result<bool, RequestError<String>>>,
    handler_ran: bool,
}

impl LifecycleWorld {
    fn new() -> Self {
        let (loopback, probe) = LoopbackTransport::new();
        let handle = TransportHandle::new("tcp://loopback:9090", loopback);
        Self {
            connection: Connection::new(handle, Arc::new(StructuredLifecycleReporter::new())),
            probe,
            policy: ConnectPolicy::Always,
            outcome: None,
            handler_ran: false,
        }
    }

    fn hooks(&self) -> RequestHooks {
        RequestHooks::new(self.connection.clone(), self.policy)
    }

    fn run_request(&mut self, fail: bool) {
        let connection = self.connection.clone();
        let mut ran = false;
        let outcome = self.hooks().run(|| {
            ran = true;
            if fail {
                Err(String::from("handler failed"))
            } else {
                Ok(connection.is_open())
            }
        });
        self.handler_ran = ran;
        self.outcome = Some(outcome);
    }

    fn run_request_with_inner_scope(&mut self) {
        let connection = self.connection.clone();
        let outcome = self.hooks().run(|| {
            let scope = connection.scope().map_err(|error| error.to_string())?;
            drop(scope);
            Ok(connection.is_open())
        });
        self.handler_ran = true;
        self.outcome = Some(outcome);
    }

    fn outcome(&self) -> &Result<bool, RequestError<String>> {
        self.outcome.as_ref().expect("a request should have run")
    }
}

#[fixture]
fn world() -> RefCell<LifecycleWorld> {
    RefCell::new(LifecycleWorld::new())
}

#[given("a client that always connects")]
fn given_always_connect(world: &RefCell<LifecycleWorld>) {
    world.borrow_mut().policy = ConnectPolicy::Always;
}

#[given("a client that connects on demand")]
fn given_on_demand(world: &RefCell<LifecycleWorld>) {
    world.borrow_mut().policy = ConnectPolicy::OnDemand;
}

#[given("the server is unreachable")]
fn given_unreachable(world: &RefCell<LifecycleWorld>) {
    world.borrow().probe.refuse_open();
}

#[when("a request runs")]
fn when_request_runs(world: &RefCell<LifecycleWorld>) {
    world.borrow_mut().run_request(false);
}

#[when("a failing request runs")]
fn when_failing_request_runs(world: &RefCell<LifecycleWorld>) {
    world.borrow_mut().run_request(true);
}

#[when("a request runs inside a connection scope")]
fn when_request_runs_in_scope(world: &RefCell<LifecycleWorld>) {
    let connection = world.borrow().connection.clone();
    let scope = connection.scope().expect("scope should open");
    world.borrow_mut().run_request(false);
    drop(scope);
}

#[when("a request opens and drops its own connection scope")]
fn when_request_nests_scope(world: &RefCell<LifecycleWorld>) {
    world.borrow_mut().run_request_with_inner_scope();
}

#[then("the request saw an open transport")]
fn then_saw_open(world: &RefCell<LifecycleWorld>) {
    assert!(matches!(world.borrow().outcome(), Ok(true)));
}

#[then("the request saw a closed transport")]
fn then_saw_closed(world: &RefCell<LifecycleWorld>) {
    assert!(matches!(world.borrow().outcome(), Ok(false)));
}

#[then("the request fails with its own error")]
fn then_fails_with_work_error(world: &RefCell<LifecycleWorld>) {
    let world = world.borrow();
    assert!(
        matches!(world.outcome(), Err(RequestError::Work(message)) if message == "handler failed")
    );
}

#[then("the request is rejected with status {status}")]
fn then_rejected_with_status(world: &RefCell<LifecycleWorld>, status: u16) {
    let world = world.borrow();
    let Err(error) = world.outcome() else {
        panic!("request should have been rejected");
    };
    assert_eq!(error.status_code(), Some(status));
    assert!(error.to_string().contains("unable to connect to thrift server"));
}

#[then("the handler did not run")]
fn then_handler_skipped(world: &RefCell<LifecycleWorld>) {
    assert!(!world.borrow().handler_ran);
}

#[then("the transport is closed")]
fn then_transport_closed(world: &RefCell<LifecycleWorld>) {
    assert!(!world.borrow().probe.is_open());
}

#[then("the transport was never opened")]
fn then_never_opened(world: &RefCell<LifecycleWorld>) {
    assert_eq!(world.borrow().probe.opens(), 0);
}

#[scenario(
    path = "tests/features/request_lifecycle.feature",
    name = "A request opens the transport and closes it afterwards"
)]
fn request_opens_and_closes(#[from(world)] world: RefCell<LifecycleWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/request_lifecycle.feature",
    name = "A failing request still closes the transport"
)]
fn failing_request_closes(#[from(world)] world: RefCell<LifecycleWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/request_lifecycle.feature",
    name = "An unreachable server aborts the request with status 500"
)]
fn unreachable_server_aborts(#[from(world)] world: RefCell<LifecycleWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/request_lifecycle.feature",
    name = "On-demand clients leave the transport alone"
)]
fn on_demand_leaves_transport(#[from(world)] world: RefCell<LifecycleWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/request_lifecycle.feature",
    name = "An explicit scope connects an on-demand client"
)]
fn explicit_scope_connects(#[from(world)] world: RefCell<LifecycleWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/request_lifecycle.feature",
    name = "A scope inside a request keeps the request's connection open"
)]
fn nested_scope_keeps_connection(#[from(world)] world: RefCell<LifecycleWorld>) {
    drop(world);
}
