//! Connects to a bridge, says hello, and prints whatever comes back.
//!
//! ```text
//! cargo run -p simpleosc_network --example hello -- [host] [port]
//! ```

use simpleosc_network::{Connection, Handlers, Target, client::announce, proto::Argument};

fn main() -> Result<(), simpleosc_network::Error> {
    let mut args = std::env::args().skip(1);
    let mut target = Target::default();

    if let Some(host) = args.next() {
        target.host = host;
    }

    if let Some(port) = args.next().and_then(|p| p.parse().ok()) {
        target.port = port;
    }

    let mut conn = Connection::new(target)?;

    conn.connect(Handlers::new().on_connect(|link| {
        announce(link);

        let args = [Argument::from(1), 2.into(), 3.4.into(), "hello".into()];
        let _ = link.send("/myosc/addr", args, true);
    }))?;

    conn.run();

    Ok(())
}
