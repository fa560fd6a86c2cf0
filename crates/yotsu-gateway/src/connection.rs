use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, trace, warn};
use url::Url;

use yotsu_types::ChannelId;
use yotsu_types::events::{EventDecodeError, GatewayCommand, LiveEvent};

/// Client heartbeat: a `ping` every 30 seconds. Two unanswered pings drop
/// the connection.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const MAX_MISSED_PONGS: u8 = 2;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid gateway url: {0}")]
    Url(#[from] url::ParseError),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("gateway connection is closed")]
    Closed,
}

/// Control side of an open connection. Dropping it closes the socket.
#[derive(Debug)]
pub struct GatewayHandle {
    commands: mpsc::UnboundedSender<GatewayCommand>,
    task: JoinHandle<()>,
}

impl GatewayHandle {
    /// Ask for channel-scoped events (messages, members) of one channel.
    pub fn subscribe(&self, channel_id: ChannelId) -> Result<(), GatewayError> {
        self.send(GatewayCommand::Subscribe { channel_id })
    }

    pub fn unsubscribe(&self, channel_id: ChannelId) -> Result<(), GatewayError> {
        self.send(GatewayCommand::Unsubscribe { channel_id })
    }

    pub fn send(&self, command: GatewayCommand) -> Result<(), GatewayError> {
        self.commands.send(command).map_err(|_| GatewayError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.task.is_finished()
    }

    /// Close the socket and wait for the connection task to finish.
    pub async fn close(self) {
        let Self { commands, task } = self;
        drop(commands);
        let _ = task.await;
    }
}

/// Open the gateway at `ws_url`, authenticating with `access_token` in the
/// query string. Events arrive on the returned receiver until the socket
/// closes, at which point the receiver yields `None`.
pub async fn connect(
    ws_url: &str,
    access_token: &str,
    heartbeat: Duration,
) -> Result<(GatewayHandle, mpsc::UnboundedReceiver<LiveEvent>), GatewayError> {
    let mut url = Url::parse(ws_url)?;
    url.query_pairs_mut().append_pair("token", access_token);

    let (socket, _) = tokio_tungstenite::connect_async(url.as_str()).await?;
    info!("Connected to gateway at {}", ws_url);

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let task = tokio::spawn(run_connection_loop(socket, command_rx, event_tx, heartbeat));

    Ok((
        GatewayHandle {
            commands: command_tx,
            task,
        },
        event_rx,
    ))
}

async fn run_connection_loop<S>(
    socket: tokio_tungstenite::WebSocketStream<S>,
    mut commands: mpsc::UnboundedReceiver<GatewayCommand>,
    events: mpsc::UnboundedSender<LiveEvent>,
    heartbeat: Duration,
) where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut sender, mut receiver) = socket.split();

    let mut ticker = tokio::time::interval(heartbeat);
    ticker.tick().await;
    let mut awaiting_pong = false;
    let mut missed_pongs: u8 = 0;

    loop {
        tokio::select! {
            frame = receiver.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(reason))) => {
                        info!("Gateway closed by server: {:?}", reason);
                        break;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!("Gateway read error: {}", e);
                        break;
                    }
                    None => break,
                };

                let event = match LiveEvent::decode(text.as_str()) {
                    Ok(event) => event,
                    Err(EventDecodeError::UnknownKind(kind)) => {
                        debug!("Skipping unknown gateway event '{}'", kind);
                        continue;
                    }
                    Err(e) => {
                        warn!("Dropping undecodable gateway frame: {}", e);
                        continue;
                    }
                };
                trace!(?event, "gateway event");

                match event {
                    LiveEvent::Ping => {
                        if send_command(&mut sender, &GatewayCommand::Pong).await.is_err() {
                            break;
                        }
                        continue;
                    }
                    LiveEvent::Pong => {
                        awaiting_pong = false;
                        missed_pongs = 0;
                        continue;
                    }
                    _ => {}
                }

                if events.send(event).is_err() {
                    debug!("Event receiver dropped, closing gateway");
                    break;
                }
            }
            command = commands.recv() => {
                let Some(command) = command else {
                    // handle dropped
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                };
                if send_command(&mut sender, &command).await.is_err() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if awaiting_pong {
                    missed_pongs += 1;
                    if missed_pongs >= MAX_MISSED_PONGS {
                        warn!(
                            "Heartbeat timeout (missed {} pongs), dropping connection",
                            missed_pongs
                        );
                        break;
                    }
                }
                awaiting_pong = true;
                if send_command(&mut sender, &GatewayCommand::Ping).await.is_err() {
                    break;
                }
            }
        }
    }

    info!("Gateway connection closed");
}

async fn send_command<W>(sender: &mut W, command: &GatewayCommand) -> Result<(), GatewayError>
where
    W: futures_util::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let text = serde_json::to_string(command)?;
    sender.send(Message::Text(text.into())).await?;
    Ok(())
}
