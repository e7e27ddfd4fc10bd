// Relay Server CLI Validation Tool
// Exercises the signaling relay through automated scenarios and interactive commands

use clap::{Parser, Subcommand};
use colored::*;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use std::io::{self, Write};
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Relay Server CLI Validation Tool", long_about = None)]
struct Cli {
    /// Server address (default: 127.0.0.1:8080)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server health endpoint
    Health,

    /// Get server configuration
    Config,

    /// Test WebSocket connection
    Connect,

    /// Join a room and wait for a partner
    Join {
        /// Room to join
        #[arg(short, long, default_value = "lobby")]
        room: String,

        /// Keep listening for messages (press Ctrl+C to exit)
        #[arg(short, long)]
        keep_alive: bool,
    },

    /// Pair two connections in one room and verify the handshake
    Pair {
        /// Room to pair in
        #[arg(short, long, default_value = "cli-pair")]
        room: String,
    },

    /// Send a chat message into a room
    Chat {
        /// Room to chat in
        #[arg(short, long, default_value = "lobby")]
        room: String,

        /// Message text
        #[arg(short, long)]
        message: String,
    },

    /// Play a scripted tic-tac-toe game between two connections
    Game {
        /// Room to play in
        #[arg(short, long, default_value = "cli-game")]
        room: String,
    },

    /// Interactive mode - send custom messages
    Interactive {
        /// Room to join first
        #[arg(short, long, default_value = "lobby")]
        room: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Health => {
            check_health(&cli.server).await;
        }
        Commands::Config => {
            check_config(&cli.server).await;
        }
        Commands::Connect => {
            test_connection(&cli.server).await;
        }
        Commands::Join { room, keep_alive } => {
            join_room(&cli.server, room, *keep_alive).await;
        }
        Commands::Pair { room } => {
            pair_scenario(&cli.server, room).await;
        }
        Commands::Chat { room, message } => {
            send_chat(&cli.server, room, message).await;
        }
        Commands::Game { room } => {
            game_scenario(&cli.server, room).await;
        }
        Commands::Interactive { room } => {
            interactive_mode(&cli.server, room).await;
        }
    }
}

async fn check_health(server: &str) {
    println!("{}", "Checking server health...".cyan());

    let url = format!("http://{}/healthz", server);
    let client = reqwest::Client::new();

    match client.get(&url).send().await {
        Ok(resp) => {
            let status = resp.status();
            if status.is_success() {
                println!("{} Health check passed", "✓".green());

                if let Ok(body) = resp.json::<serde_json::Value>().await {
                    println!("  Status: {}", body["status"].as_str().unwrap_or("unknown"));
                    println!("  Service: {}", body["service"].as_str().unwrap_or("unknown"));
                    println!("  Version: {}", body["version"].as_str().unwrap_or("unknown"));
                }
            } else {
                println!("{} Health check failed: {}", "✗".red(), status);
            }
        }
        Err(e) => {
            println!("{} Cannot connect to server: {}", "✗".red(), e);
            println!("  Make sure the server is running on {}", server);
        }
    }
}

async fn check_config(server: &str) {
    println!("{}", "Fetching server configuration...".cyan());

    let url = format!("http://{}/config", server);
    let client = reqwest::Client::new();

    match client.get(&url).send().await {
        Ok(resp) => {
            if resp.status().is_success() {
                println!("{} Config endpoint accessible", "✓".green());

                if let Ok(body) = resp.json::<serde_json::Value>().await {
                    println!("\nConfiguration:");
                    match serde_json::to_string_pretty(&body) {
                        Ok(pretty) => println!("{}", pretty),
                        Err(_) => println!("{}", body),
                    }
                }
            } else {
                println!("{} Config fetch failed: {}", "✗".red(), resp.status());
            }
        }
        Err(e) => {
            println!("{} Cannot connect to server: {}", "✗".red(), e);
        }
    }
}

async fn test_connection(server: &str) {
    println!("{}", "Testing WebSocket connection...".cyan());

    let url = format!("ws://{}/ws", server);

    match connect_async(&url).await {
        Ok((ws_stream, _)) => {
            println!("{} WebSocket connection established", "✓".green());
            println!("  URL: {}", url);
            drop(ws_stream);
            println!("{} Connection closed cleanly", "✓".green());
        }
        Err(e) => {
            println!("{} WebSocket connection failed: {}", "✗".red(), e);
        }
    }
}

async fn open_and_join(server: &str, room: &str) -> Option<(WsWriter, WsReader)> {
    let url = format!("ws://{}/ws", server);

    let (ws_stream, _) = match connect_async(&url).await {
        Ok(conn) => conn,
        Err(e) => {
            println!("{} Cannot connect to server: {}", "✗".red(), e);
            return None;
        }
    };

    let (mut write, read) = ws_stream.split();
    let ready = json!({ "type": "client_ready", "room_id": room });
    if write.send(Message::Text(ready.to_string())).await.is_err() {
        println!("{} Failed to send client_ready", "✗".red());
        return None;
    }

    Some((write, read))
}

async fn join_room(server: &str, room: &str, keep_alive: bool) {
    println!("{}", "Joining room...".cyan());
    println!("  Room: {}", room);

    let Some((_write, mut read)) = open_and_join(server, room).await else {
        return;
    };

    println!("{} client_ready sent, waiting for a partner", "✓".green());

    if !keep_alive {
        println!("\n{}", "⚠ Note: Connection closes on exit. Use --keep-alive to stay in the room.".yellow());
        return;
    }

    loop {
        match timeout(Duration::from_secs(30), read.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => {
                println!("{} {}", "◀".green(), text.bright_white());
            }
            Ok(Some(Ok(Message::Close(_)))) => {
                println!("{} Server closed the connection", "✗".yellow());
                break;
            }
            Ok(Some(Ok(_))) => continue,
            Ok(Some(Err(e))) => {
                println!("{} Connection error: {}", "✗".red(), e);
                break;
            }
            Ok(None) => {
                println!("{} Connection closed", "✗".yellow());
                break;
            }
            Err(_) => continue,
        }
    }
}

async fn next_json(read: &mut WsReader, wait: Duration) -> Option<serde_json::Value> {
    loop {
        match timeout(wait, read.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => {
                return serde_json::from_str(&text).ok();
            }
            Ok(Some(Ok(_))) => continue,
            _ => return None,
        }
    }
}

async fn pair_scenario(server: &str, room: &str) {
    println!("{}", "Pairing two connections...".cyan());
    println!("  Room: {}", room);

    let Some((_write_a, mut read_a)) = open_and_join(server, room).await else {
        return;
    };
    let Some((_write_b, mut read_b)) = open_and_join(server, room).await else {
        return;
    };

    let mut first_got_notification = false;
    let mut state_broadcasts = 0;

    for _ in 0..3 {
        match next_json(&mut read_a, Duration::from_secs(2)).await {
            Some(msg) if msg["type"] == "peer_connected" => first_got_notification = true,
            Some(msg) if msg["type"].as_str().unwrap_or("").ends_with("_state") => {
                state_broadcasts += 1
            }
            _ => break,
        }
    }

    if first_got_notification {
        println!("{} First connection received peer_connected", "✓".green());
    } else {
        println!("{} First connection missed peer_connected", "✗".red());
    }
    println!("  State broadcasts to first connection: {}", state_broadcasts);

    let mut second_states = 0;
    for _ in 0..2 {
        if let Some(msg) = next_json(&mut read_b, Duration::from_secs(2)).await {
            if msg["type"].as_str().unwrap_or("").ends_with("_state") {
                second_states += 1;
            }
        }
    }
    println!("  State broadcasts to second connection: {}", second_states);

    if first_got_notification && second_states == 2 {
        println!("{}", "Pairing handshake verified".green().bold());
    } else {
        println!("{}", "Pairing handshake incomplete".red().bold());
    }
}

async fn send_chat(server: &str, room: &str, message: &str) {
    println!("{}", "Sending chat message...".cyan());

    let Some((mut write, mut read)) = open_and_join(server, room).await else {
        return;
    };

    let chat = json!({ "type": "chat", "sender": "relay-cli", "message": message });
    if write.send(Message::Text(chat.to_string())).await.is_err() {
        println!("{} Failed to send chat message", "✗".red());
        return;
    }

    println!("{} Chat message sent", "✓".green());

    // Chat is broadcast to the whole room, sender included
    match next_json(&mut read, Duration::from_secs(2)).await {
        Some(msg) if msg["type"] == "chat" => {
            println!("{} Broadcast echo received: {}", "✓".green(), msg["message"]);
        }
        _ => {
            println!("{} No broadcast echo (room may be empty)", "✗".yellow());
        }
    }
}

async fn game_scenario(server: &str, room: &str) {
    println!("{}", "Playing a scripted tic-tac-toe game...".cyan());
    println!("  Room: {}", room);

    let Some((mut write_a, mut read_a)) = open_and_join(server, room).await else {
        return;
    };
    let Some((mut write_b, mut read_b)) = open_and_join(server, room).await else {
        return;
    };

    // Drain the pairing handshake
    for _ in 0..3 {
        let _ = next_json(&mut read_a, Duration::from_secs(2)).await;
    }
    for _ in 0..2 {
        let _ = next_json(&mut read_b, Duration::from_secs(2)).await;
    }

    // X takes the top row while O fills the middle
    let script: [(bool, usize); 5] = [(true, 0), (false, 3), (true, 1), (false, 4), (true, 2)];

    let mut last_state = serde_json::Value::Null;
    for (is_first, cell) in script {
        let writer = if is_first { &mut write_a } else { &mut write_b };
        let msg = json!({ "type": "tic_tac_toe_move", "cell": cell });
        if writer.send(Message::Text(msg.to_string())).await.is_err() {
            println!("{} Failed to send move", "✗".red());
            return;
        }

        if let Some(state) = next_json(&mut read_a, Duration::from_secs(2)).await {
            let _ = next_json(&mut read_b, Duration::from_secs(2)).await;
            println!("  {} cell {} -> {}", "▶".cyan(), cell, state["state"]["currentPlayer"]);
            last_state = state;
        }
    }

    if last_state["state"]["winner"] == "X" && last_state["state"]["active"] == false {
        println!("{}", "Scripted game finished with the expected X win".green().bold());
    } else {
        println!(
            "{} Unexpected final state: {}",
            "✗".red(),
            last_state["state"]
        );
    }
}

async fn interactive_mode(server: &str, room: &str) {
    println!("{}", "Interactive mode".cyan().bold());
    println!("Type a JSON message per line, or 'quit' to exit.");
    println!("Example: {{\"type\":\"chat\",\"message\":\"hello\"}}");

    let Some((mut write, mut read)) = open_and_join(server, room).await else {
        return;
    };

    // Print everything the server pushes at us
    let reader_task = tokio::spawn(async move {
        while let Some(Ok(message)) = read.next().await {
            if let Message::Text(text) = message {
                println!("\n{} {}", "◀".green(), text.bright_white());
                print!("> ");
                let _ = io::stdout().flush();
            }
        }
    });

    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        if stdin.read_line(&mut line).is_err() {
            break;
        }
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }

        if serde_json::from_str::<serde_json::Value>(line).is_err() {
            println!("{} Not valid JSON", "✗".yellow());
            continue;
        }

        if write.send(Message::Text(line.to_string())).await.is_err() {
            println!("{} Connection lost", "✗".red());
            break;
        }
    }

    reader_task.abort();
    println!("{}", "Goodbye".cyan());
}
