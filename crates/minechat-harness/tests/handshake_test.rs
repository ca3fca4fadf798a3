//! Token handshake outcomes and registration over simulated TCP.

use std::time::Duration;

use minechat_client::{RunError, SystemEnv, auth, line};
use minechat_core::{
    Alert, AuthFailurePolicy, Channel, ClientConfig, ConnectionState, RetryPolicy,
    SupervisorConfig,
};
use minechat_harness::{ChatServer, ClientRig, ReceivedMessage, SimNetwork};

fn client_config(token: &str) -> ClientConfig {
    ClientConfig {
        host: "test".to_string(),
        read_port: 1,
        write_port: 2,
        token: token.to_string(),
    }
}

fn sim() -> turmoil::Sim<'static> {
    turmoil::Builder::new().simulation_duration(Duration::from_secs(60)).build()
}

#[test]
fn invalid_token_stops_with_alert() {
    let mut sim = sim();
    let server = ChatServer::new(1, 2).with_account("abc", "Steve");
    let log = server.log();

    sim.host("test", move || server.clone().serve());

    sim.client("client", async {
        let rig =
            ClientRig::new(SimNetwork::new(), client_config("wrong"), SupervisorConfig::default());
        let outcome = rig.run_for(Duration::from_secs(30)).await;

        assert!(matches!(outcome.result, Err(RunError::InvalidToken)));
        assert_eq!(outcome.alerts, vec![Alert::InvalidToken]);
        assert!(outcome.nicknames().is_empty());
        assert_eq!(outcome.states(Channel::Write), vec![
            ConnectionState::Initiated,
            ConnectionState::Established,
            ConnectionState::Closed,
        ]);
        Ok(())
    });

    sim.run().expect("simulation failed");
    assert_eq!(log.rejected_tokens(), 1);
}

#[test]
fn invalid_token_retry_policy_alerts_every_cycle() {
    let mut sim = sim();
    let server = ChatServer::new(1, 2).with_account("abc", "Steve");
    let log = server.log();

    sim.host("test", move || server.clone().serve());

    sim.client("client", async {
        let config =
            SupervisorConfig { auth_failure: AuthFailurePolicy::Retry, ..Default::default() };
        let rig = ClientRig::new(SimNetwork::new(), client_config("wrong"), config);
        let outcome = rig.run_for(Duration::from_secs(5)).await;

        assert!(outcome.result.is_ok());
        assert!(outcome.alerts.len() >= 2);
        assert!(outcome.alerts.iter().all(|alert| *alert == Alert::InvalidToken));
        Ok(())
    });

    sim.run().expect("simulation failed");
    assert!(log.rejected_tokens() >= 2);
}

#[test]
fn registered_account_can_chat() {
    let mut sim = sim();
    let server = ChatServer::new(1, 2);
    let log = server.log();

    sim.host("test", move || server.clone().serve());

    sim.client("client", async {
        let network = SimNetwork::new();

        let mut connection =
            line::acquire(&network, &SystemEnv::new(), "test", 2, &RetryPolicy::default()).await?;
        let registration = auth::register(&mut connection, "Ste\\nve\n").await?;
        drop(connection);
        assert_eq!(registration.nickname, "Steve");

        let config = SupervisorConfig {
            keepalive_interval: Some(Duration::from_millis(200)),
            ..Default::default()
        };
        let rig = ClientRig::new(network, client_config(&registration.account_hash), config);
        rig.send("hi, I am new here");

        let outcome = rig.run_for(Duration::from_secs(3)).await;
        assert!(outcome.result.is_ok());
        assert_eq!(outcome.nicknames().first().map(String::as_str), Some("Steve"));
        Ok(())
    });

    sim.run().expect("simulation failed");
    assert_eq!(log.registrations(), 1);
    assert_eq!(log.messages(), vec![ReceivedMessage {
        nickname: "Steve".to_string(),
        text: "hi, I am new here".to_string(),
    }]);
}
