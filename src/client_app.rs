//! Interactive client (C9, client side): a stdin command loop driving login,
//! room entry, chat, and the `/popular` `/stats` `/leave` `/help` `/exit`
//! slash commands.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client_net;
use crate::config::ClientArgs;
use crate::handlers::now_unix;
use crate::protocol::messages::{
    ClientMessage, CmChat, CmCommandGm, CmEnter, CmLeave, CmLogin, CommandType, EnterErrCode, LeaveErrCode,
    LoginErrCode, ServerMessage,
};

const HELP_TEXT: &str = "commands: /popular <roomId>  /stats <nickname>  /leave  /help  /exit";

pub async fn run(args: ClientArgs) -> anyhow::Result<()> {
    let token = CancellationToken::new();
    let stream = client_net::dial(&args.addr, &token)
        .await
        .ok_or_else(|| anyhow::anyhow!("dial cancelled"))?;
    let peer_addr = stream.peer_addr()?;
    let io = client_net::connect(stream, peer_addr)?;

    let mut inbound = io.inbound;
    let outbound = io.outbound;

    let printer_outbound = outbound.clone();
    tokio::spawn(async move {
        while let Some(msg) = inbound.recv().await {
            print_server_message(msg, &printer_outbound);
        }
        info!("server connection closed");
    });

    println!("{HELP_TEXT}");
    println!("nickname:");

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    let Some(nickname) = lines.next_line().await? else {
        return Ok(());
    };
    let _ = outbound.send_message(ClientMessage::Login(CmLogin {
        nickname: nickname.trim().to_string(),
        send_time: now_unix(),
    }));

    println!("room id:");
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("/popular") {
            let param = rest.trim().to_string();
            let _ = outbound.send_message(ClientMessage::CommandGm(CmCommandGm {
                cmd_type: CommandType::Popular,
                param,
            }));
        } else if let Some(rest) = line.strip_prefix("/stats") {
            let param = rest.trim().to_string();
            let _ = outbound.send_message(ClientMessage::CommandGm(CmCommandGm {
                cmd_type: CommandType::Stats,
                param,
            }));
        } else if line == "/leave" {
            let _ = outbound.send_message(ClientMessage::Leave(CmLeave));
        } else if line == "/help" {
            println!("{HELP_TEXT}");
        } else if line == "/exit" {
            break;
        } else if let Ok(room_id) = line.parse::<u32>() {
            let _ = outbound.send_message(ClientMessage::Enter(CmEnter { room_id }));
        } else {
            let _ = outbound.send_message(ClientMessage::Chat(CmChat {
                content: line.to_string(),
                send_time: now_unix(),
            }));
        }
    }

    outbound.close();
    Ok(())
}

fn print_server_message(msg: ServerMessage, outbound: &crate::connection::OutboundHandle<ClientMessage>) {
    match msg {
        ServerMessage::RespLogin(r) => match r.err_code {
            LoginErrCode::LoginOk => println!("login ok"),
            LoginErrCode::NicknameExist => {
                println!("nickname already taken, try again:");
                let _ = outbound; // server will receive a fresh CMLogin from stdin
            }
        },
        ServerMessage::RespEnter(r) => match r.err_code {
            EnterErrCode::EnterOk => println!("entered room"),
            EnterErrCode::InvalidRoomId => println!("invalid room id, try again:"),
        },
        ServerMessage::RespLeave(r) => match r.err_code {
            LeaveErrCode::LeaveOk => println!("left room"),
            LeaveErrCode::NotInRoom => println!("not in a room"),
            // treated the same as LeaveOk client-side, matching upstream behavior
            LeaveErrCode::InvalidRoomId => println!("left room"),
        },
        ServerMessage::UserEnter(e) => println!("* {} entered the room", e.nickname),
        ServerMessage::UserLeave(e) => println!("* {} left the room", e.nickname),
        ServerMessage::ChatContent(c) => println!("{}: {}", c.nickname, c.content),
        ServerMessage::UserStats(s) => println!("{}: {}", s.nickname, s.stats),
        ServerMessage::PopularWord(p) => println!("most popular word: {}", p.the_word),
    }
}
