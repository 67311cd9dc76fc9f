use crate::entities::player::PlayerId;
use crate::net::protocol::decode_intent;
use crate::net::worker::{WorldCommand, WorldWorker};
use crate::net::ws::{self, Opcode, WsFrameError, WsHandshakeConfig};
use crate::telemetry::logging;
use crate::world::state::World;
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const ACCEPT_POLL: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub struct ServerControl {
    running: AtomicBool,
}

impl ServerControl {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
        }
    }

    pub fn request_shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for ServerControl {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct GameServerConfig {
    pub bind_addr: String,
    pub tick_period: Duration,
    pub ws_allowed_origins: Option<Vec<String>>,
    pub handshake_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for GameServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3002".to_string(),
            tick_period: Duration::from_millis(200),
            ws_allowed_origins: None,
            handshake_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(15 * 60),
            write_timeout: Duration::from_secs(5),
        }
    }
}

pub fn bind(config: &GameServerConfig) -> Result<TcpListener, String> {
    let listener = TcpListener::bind(&config.bind_addr)
        .map_err(|err| format!("bind {} failed: {}", config.bind_addr, err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("listener nonblocking failed: {}", err))?;
    Ok(listener)
}

/// Runs the world worker and the accept loop until `control` asks for shutdown.
pub fn serve(
    listener: TcpListener,
    config: GameServerConfig,
    world: World,
    control: Arc<ServerControl>,
) -> Result<(), String> {
    let local_addr = listener
        .local_addr()
        .map_err(|err| format!("listener address unavailable: {}", err))?;
    logging::log_game(&format!("game server listening on {}", local_addr));
    println!("wildwood: listening on {}", local_addr);

    let (commands, inbox) = mpsc::channel();
    let worker = WorldWorker::new(world, config.tick_period, Instant::now());
    let worker_control = Arc::clone(&control);
    let worker_handle = thread::Builder::new()
        .name("world".to_string())
        .spawn(move || worker.run(inbox, worker_control))
        .map_err(|err| format!("world thread spawn failed: {}", err))?;

    let ws_config = WsHandshakeConfig {
        allowed_origins: config.ws_allowed_origins.clone(),
    };
    let timeouts = Timeouts {
        handshake: config.handshake_timeout,
        read: config.read_timeout,
        write: config.write_timeout,
    };

    while control.is_running() {
        match listener.accept() {
            Ok((stream, addr)) => {
                let commands = commands.clone();
                let ws_config = ws_config.clone();
                thread::spawn(move || {
                    if let Err(err) = handle_connection(stream, &ws_config, timeouts, commands) {
                        logging::log_error(&format!("connection {} error: {}", addr, err));
                        eprintln!("wildwood: connection {} error: {}", addr, err);
                    }
                });
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL);
            }
            Err(err) => {
                logging::log_error(&format!("accept error: {}", err));
                eprintln!("wildwood: accept error: {}", err);
            }
        }
    }

    drop(commands);
    worker_handle
        .join()
        .map_err(|_| "world thread panicked".to_string())?;
    logging::log_game("game server stopped");
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct Timeouts {
    handshake: Duration,
    read: Duration,
    write: Duration,
}

fn handle_connection(
    mut stream: TcpStream,
    ws_config: &WsHandshakeConfig,
    timeouts: Timeouts,
    commands: Sender<WorldCommand>,
) -> Result<(), String> {
    stream
        .set_nonblocking(false)
        .map_err(|err| format!("stream blocking mode failed: {}", err))?;
    let _ = stream.set_nodelay(true);
    stream
        .set_read_timeout(Some(timeouts.handshake))
        .map_err(|err| format!("handshake read timeout failed: {}", err))?;
    stream
        .set_write_timeout(Some(timeouts.write))
        .map_err(|err| format!("write timeout failed: {}", err))?;
    ws::accept_handshake(&mut stream, ws_config)?;
    stream
        .set_read_timeout(Some(timeouts.read))
        .map_err(|err| format!("read timeout failed: {}", err))?;

    let writer = Arc::new(Mutex::new(
        stream
            .try_clone()
            .map_err(|err| format!("stream clone failed: {}", err))?,
    ));
    let (outbound, queue) = mpsc::channel::<Arc<str>>();
    let (reply, replies) = mpsc::channel();
    commands
        .send(WorldCommand::Connect { outbound, reply })
        .map_err(|_| "world worker unavailable".to_string())?;
    let player = replies
        .recv()
        .map_err(|_| "world worker dropped connect".to_string())?;

    let writer_stream = Arc::clone(&writer);
    let writer_handle = thread::spawn(move || {
        for message in queue {
            let Ok(mut stream) = writer_stream.lock() else {
                break;
            };
            // A stalled client hits the write timeout; closing the socket
            // wakes the reader so the session is disconnected.
            if ws::write_text(&mut *stream, &message).is_err() {
                let _ = stream.shutdown(Shutdown::Both);
                break;
            }
        }
    });

    let result = read_loop(&mut stream, player, &writer, &commands);
    let _ = commands.send(WorldCommand::Disconnect { player });
    let _ = stream.shutdown(Shutdown::Both);
    let _ = writer_handle.join();
    result
}

fn read_loop(
    stream: &mut TcpStream,
    player: PlayerId,
    writer: &Mutex<TcpStream>,
    commands: &Sender<WorldCommand>,
) -> Result<(), String> {
    loop {
        let frame = match ws::read_frame(stream) {
            Ok(frame) => frame,
            Err(WsFrameError::Closed) => return Ok(()),
            Err(WsFrameError::Timeout) => {
                return Err(format!("player {} idle past read timeout", player.0))
            }
            Err(err) => return Err(err.to_string()),
        };
        match frame.opcode {
            Opcode::Text => {
                let text = match std::str::from_utf8(&frame.payload) {
                    Ok(text) => text,
                    Err(_) => {
                        logging::log_error(&format!("player {} sent non-utf8 text", player.0));
                        continue;
                    }
                };
                match decode_intent(text) {
                    Ok(intent) => commands
                        .send(WorldCommand::Intent { player, intent })
                        .map_err(|_| "world worker unavailable".to_string())?,
                    Err(err) => logging::log_error(&format!("player {}: {}", player.0, err)),
                }
            }
            Opcode::Ping => send_control(writer, Opcode::Pong, &frame.payload)?,
            Opcode::Close => {
                let _ = send_control(writer, Opcode::Close, &frame.payload);
                return Ok(());
            }
            Opcode::Pong | Opcode::Binary | Opcode::Continuation => {}
        }
    }
}

fn send_control(writer: &Mutex<TcpStream>, opcode: Opcode, payload: &[u8]) -> Result<(), String> {
    let mut stream = writer
        .lock()
        .map_err(|_| "writer lock poisoned".to_string())?;
    ws::write_frame(&mut *stream, opcode, payload)
}
