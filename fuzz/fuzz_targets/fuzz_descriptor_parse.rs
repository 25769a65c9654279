#![no_main]

use ldap_session::Descriptor;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: &str| {
    let Ok(descriptor) = Descriptor::parse(input) else {
        return;
    };

    if let Ok((config, _credential)) = descriptor.resolve() {
        assert_eq!(config.servers.len(), descriptor.endpoints().len());
        assert!(config.base_dn().is_some());
        let _ = config.socket_options();
        let _ = config.starttls();
    }
});
