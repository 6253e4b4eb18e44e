const BROKER_HOST: &str = "SYSPULSE_BROKER_HOST";

pub fn get_broker_host_override() -> Option<String> {
    std::env::var(BROKER_HOST).ok()
}

const BROKER_PORT: &str = "SYSPULSE_BROKER_PORT";

pub fn get_broker_port_override() -> Option<u16> {
    let port_from_env = std::env::var(BROKER_PORT);
    port_from_env.ok().and_then(|res| res.parse().ok())
}
