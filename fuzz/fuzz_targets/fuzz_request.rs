//! Fuzz target: request parsing and routing.
//!
//! Feeds arbitrary bytes through the same path a received request takes
//! (lossy UTF-8 decode, path extraction, command resolution, reply header)
//! and checks that nothing panics and every reply is well-formed.
//!
//! cargo fuzz run fuzz_request

#![no_main]

use libfuzzer_sys::fuzz_target;
use rccar::app::commands::{Command, request_path};
use rccar::app::router::{CommandRouter, Reply};
use rccar::config::Capability;

fuzz_target!(|data: &[u8]| {
    let request = String::from_utf8_lossy(data);

    let path = request_path(&request);
    assert!(path == "/" || request.contains(path));

    for capability in [Capability::MotorsOnly, Capability::MotorsAndLight] {
        let router = CommandRouter::new(capability);
        let command = router.resolve(&request);
        if !capability.has_light() {
            assert!(!matches!(command, Command::LightOn | Command::LightOff));
        }

        let reply = match command {
            Command::Page => Reply::Page(rccar::web::control_page(capability)),
            _ => Reply::Ack,
        };
        let header = reply.header().expect("reply header fits");
        assert!(header.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(header.ends_with("\r\n\r\n"));
    }
});
