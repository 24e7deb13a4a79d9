//! Load-generating benchmark client (C6 client side, exercised at scale):
//! spawns `num` simulated clients, each logging in, entering a (sometimes
//! intentionally invalid) room, and sending chat lines at roughly 1/s.

use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::client_net;
use crate::config::BenchmarkArgs;
use crate::handlers::now_unix;
use crate::protocol::messages::{ClientMessage, CmChat, CmEnter, CmLogin};

pub async fn run(args: BenchmarkArgs) -> anyhow::Result<()> {
    info!(num = args.num, addr = %args.addr, "starting benchmark");

    let mut handles = Vec::with_capacity(args.num);
    for i in 0..args.num {
        let addr = args.addr.clone();
        handles.push(tokio::spawn(simulate_client(addr, i)));
    }

    for handle in handles {
        let _ = handle.await;
    }
    Ok(())
}

async fn simulate_client(addr: String, index: usize) {
    let token = CancellationToken::new();
    let Some(stream) = client_net::dial(&addr, &token).await else {
        return;
    };
    let peer_addr = match stream.peer_addr() {
        Ok(a) => a,
        Err(e) => {
            warn!(error = %e, "benchmark client could not read peer addr");
            return;
        }
    };
    let io = match client_net::connect(stream, peer_addr) {
        Ok(io) => io,
        Err(e) => {
            warn!(error = %e, "benchmark client failed to wire up transport");
            return;
        }
    };

    let mut inbound = io.inbound;
    tokio::spawn(async move { while inbound.recv().await.is_some() {} });

    let nickname = format!("Client_{index:05}");
    let _ = io.outbound.send_message(ClientMessage::Login(CmLogin {
        nickname: nickname.clone(),
        send_time: now_unix(),
    }));

    // Intentionally exercises the invalid-room path roughly half the time:
    // room ids are drawn from [0, 10) against only 5 real rooms.
    let room_id: u32 = rand::thread_rng().gen_range(0..10);
    let _ = io.outbound.send_message(ClientMessage::Enter(CmEnter { room_id }));

    loop {
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..500));
        tokio::time::sleep(Duration::from_secs(1) + jitter).await;
        let line = format!("hello from {nickname} at {}", now_unix());
        if io
            .outbound
            .send_message(ClientMessage::Chat(CmChat {
                content: line,
                send_time: now_unix(),
            }))
            .is_err()
        {
            break;
        }
    }
}
