// ABOUTME: In-process SMSC used by the transmitter integration tests
// ABOUTME: Answers bind, unbind and enquire_link itself and hands everything else to a behavior closure

#![allow(dead_code)]

use smpp_transmitter::codec::Frame;
use smpp_transmitter::connection;
use smpp_transmitter::datatypes::{CommandId, CommandStatus};
use smpp_transmitter::pdu::Pdu;
use smpp_transmitter::registry::FieldTag;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub const SYSTEM_ID: &str = "root";
pub const PASSWORD: &str = "secret";

/// Per-connection reaction to every request the mock does not answer itself.
/// The returned PDUs are written in order.
pub trait Behavior: Send + 'static {
    fn on_request(&mut self, pdu: Pdu) -> Vec<Pdu>;
}

impl<F> Behavior for F
where
    F: FnMut(Pdu) -> Vec<Pdu> + Send + 'static,
{
    fn on_request(&mut self, pdu: Pdu) -> Vec<Pdu> {
        self(pdu)
    }
}

type Log = Arc<Mutex<Vec<Pdu>>>;

pub struct MockSmsc {
    addr: String,
    received: Log,
    task: JoinHandle<()>,
}

impl MockSmsc {
    /// SMSC that accepts every submit with message id "foobar"
    pub async fn start_default() -> MockSmsc {
        Self::start(|| accept_all).await
    }

    pub async fn start<F, B>(factory: F) -> MockSmsc
    where
        F: Fn() -> B + Send + Sync + 'static,
        B: Behavior,
    {
        Self::listen(move |socket, log| serve(socket, factory(), Duration::ZERO, log)).await
    }

    /// Like `start_default`, but every bind response is held back for `delay`
    pub async fn start_slow_bind(delay: Duration) -> MockSmsc {
        Self::listen(move |socket, log| serve(socket, accept_all, delay, log)).await
    }

    /// SMSC that reads and records everything but never answers, not even
    /// the bind
    pub async fn start_silent() -> MockSmsc {
        Self::listen(silent).await
    }

    /// SMSC that accepts the bind and then stops reading from the socket
    pub async fn start_unresponsive() -> MockSmsc {
        Self::listen(unresponsive).await
    }

    async fn listen<H, Fut>(handler: H) -> MockSmsc
    where
        H: Fn(TcpStream, Log) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let received = Log::default();

        let log = received.clone();
        let task = tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(handler(socket, log.clone()));
            }
        });

        MockSmsc {
            addr,
            received,
            task,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Every PDU the mock has read, in arrival order
    pub fn received(&self) -> Vec<Pdu> {
        self.received.lock().unwrap().clone()
    }

    pub fn received_of(&self, command_id: CommandId) -> Vec<Pdu> {
        self.received()
            .into_iter()
            .filter(|pdu| pdu.command_id == command_id)
            .collect()
    }

    /// Waits up to two seconds for `count` PDUs of `command_id`.
    pub async fn wait_for(&self, command_id: CommandId, count: usize) -> Vec<Pdu> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let found = self.received_of(command_id);
            if found.len() >= count || tokio::time::Instant::now() >= deadline {
                return found;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Drop for MockSmsc {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve<B: Behavior>(socket: TcpStream, mut behavior: B, bind_delay: Duration, log: Log) {
    let (mut reader, mut writer) = connection::split(socket);

    while let Ok(Some(frame)) = reader.read_frame().await {
        let Frame::Pdu(pdu) = frame else {
            continue;
        };
        log.lock().unwrap().push(pdu.clone());

        let replies = match pdu.command_id {
            CommandId::BindTransmitter => {
                tokio::time::sleep(bind_delay).await;
                vec![bind_response(&pdu)]
            }
            CommandId::Unbind => pdu.response(CommandStatus::Ok).into_iter().collect(),
            _ if pdu.is_response() => Vec::new(),
            _ => behavior.on_request(pdu),
        };

        for reply in replies {
            if writer.write_pdu(&reply).await.is_err() {
                return;
            }
        }
    }
}

async fn silent(socket: TcpStream, log: Log) {
    let (mut reader, _writer) = connection::split(socket);
    while let Ok(Some(frame)) = reader.read_frame().await {
        if let Frame::Pdu(pdu) = frame {
            log.lock().unwrap().push(pdu);
        }
    }
}

async fn unresponsive(socket: TcpStream, log: Log) {
    let (mut reader, mut writer) = connection::split(socket);
    let Ok(Some(Frame::Pdu(bind))) = reader.read_frame().await else {
        return;
    };
    log.lock().unwrap().push(bind.clone());

    if writer.write_pdu(&bind_response(&bind)).await.is_ok() {
        // keep both halves open without ever reading again
        std::future::pending::<()>().await;
    }
}

fn bind_response(request: &Pdu) -> Pdu {
    let accepted = request.str_field(FieldTag::SystemId) == Some(SYSTEM_ID)
        && request.str_field(FieldTag::Password) == Some(PASSWORD);

    if accepted {
        Pdu::new(CommandId::BindTransmitterResp, request.sequence_number)
            .with_field(FieldTag::SystemId, "mock-smsc")
    } else {
        // error responses carry no body
        Pdu::new(CommandId::BindTransmitterResp, request.sequence_number)
            .with_status(CommandStatus::InvalidPassword)
    }
}

/// Accepts every submit as "foobar", reports every queried message as
/// delivered and answers enquire_link.
pub fn accept_all(pdu: Pdu) -> Vec<Pdu> {
    match pdu.command_id {
        CommandId::SubmitSm => vec![submit_resp(&pdu, "foobar")],
        CommandId::QuerySm => vec![query_resp(&pdu, 2)],
        _ => pdu.response(CommandStatus::Ok).into_iter().collect(),
    }
}

pub fn submit_resp(request: &Pdu, message_id: &str) -> Pdu {
    Pdu::new(CommandId::SubmitSmResp, request.sequence_number)
        .with_field(FieldTag::MessageId, message_id)
}

pub fn query_resp(request: &Pdu, state: u8) -> Pdu {
    Pdu::new(CommandId::QuerySmResp, request.sequence_number)
        .with_field(FieldTag::MessageId, request.message_id().unwrap_or_default())
        .with_field(FieldTag::FinalDate, "")
        .with_field(FieldTag::MessageState, state)
        .with_field(FieldTag::ErrorCode, 0u8)
}

pub fn error_resp(request: &Pdu, status: CommandStatus) -> Pdu {
    Pdu::new(request.command_id.response().unwrap(), request.sequence_number).with_status(status)
}
