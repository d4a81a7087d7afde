use crate::examples::door::DoorProtocol;
use crate::grammar::{Automaton, Transition};
use crate::simulator::{pipe, AbstractionLayer, Actor, PipeChannel};
use crate::vocabulary::Preset;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

fn run_server(end: PipeChannel) -> thread::JoinHandle<(bool, Vec<String>)> {
    thread::spawn(move || {
        let protocol = DoorProtocol::new();
        let layer = AbstractionLayer::new(Box::new(end), protocol.catalogue())
            .unwrap()
            .with_timeout(Duration::from_secs(5));
        let mut actor = Actor::new("server", protocol.server_automaton(), layer, false);
        let outcome = actor.run();
        (outcome.is_ok(), actor.visit_log().to_vec())
    })
}

#[test]
fn the_door_dialogue_completes() {
    let (client_end, server_end) = pipe();
    let server = run_server(server_end);

    let client = thread::spawn(move || {
        let protocol = DoorProtocol::new();
        let layer = AbstractionLayer::new(Box::new(client_end), protocol.catalogue())
            .unwrap()
            .with_timeout(Duration::from_secs(5));
        let mut actor = Actor::new("client", protocol.client_automaton(), layer, true);
        let outcome = actor.run();
        (outcome.is_ok(), actor.visit_log().to_vec())
    });

    let (client_ok, client_log) = client.join().unwrap();
    let (server_ok, server_log) = server.join().unwrap();

    assert!(client_ok, "client failed: {:#?}", client_log);
    assert!(server_ok, "server failed: {:#?}", server_log);
    assert_eq!(client_log[0], "  [+] At state 's0'");
    assert!(client_log
        .iter()
        .any(|line| line.contains("Received expected symbol 'open_granted'")));
    assert!(server_log
        .iter()
        .any(|line| line.contains("corresponds to transition 'serve_ok")));
    assert!(server_log
        .iter()
        .any(|line| line.contains("corresponds to transition 'collect")));
}

#[test]
fn a_wrong_code_is_denied() {
    let (client_end, server_end) = pipe();
    let server = run_server(server_end);

    let client = thread::spawn(move || {
        let protocol = DoorProtocol::new();

        // An impostor endpoint: wrong code, and it hangs up right after
        // the verdict.
        let mut automaton = Automaton::new("impostor");
        let s0 = automaton.add_state("s0");
        let s1 = automaton.add_state("s1");
        let s2 = automaton.add_state("s2");
        let s3 = automaton.add_state("s3");
        automaton.add_transition(Transition::open_channel("open", s0, s1));
        automaton.add_transition(
            Transition::new(
                "request",
                s1,
                s2,
                &protocol.open_request,
                vec![
                    Rc::clone(&protocol.open_granted),
                    Rc::clone(&protocol.open_denied),
                ],
            )
            .with_input_preset(Preset::new().pin_field("code", "9999")),
        );
        automaton.add_transition(Transition::close_channel("close", s2, s3));

        let layer = AbstractionLayer::new(Box::new(client_end), protocol.catalogue())
            .unwrap()
            .with_timeout(Duration::from_secs(5));
        let mut actor = Actor::new("impostor", automaton, layer, true);
        let outcome = actor.run();
        (outcome.is_ok(), actor.visit_log().to_vec())
    });

    let (client_ok, client_log) = client.join().unwrap();
    let (server_ok, server_log) = server.join().unwrap();

    assert!(client_ok, "client failed: {:#?}", client_log);
    assert!(server_ok, "server failed: {:#?}", server_log);
    assert!(client_log
        .iter()
        .any(|line| line.contains("Received expected symbol 'open_denied'")));
    assert!(server_log
        .iter()
        .any(|line| line.contains("corresponds to transition 'serve_ko")));
}
