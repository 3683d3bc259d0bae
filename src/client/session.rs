// ABOUTME: One bound SMPP connection: reader loop, serialized writer, sequence numbers and teardown
// ABOUTME: Background tasks (reader, expiry sweeper, keep-alive) stop on the session's halt signal

use crate::client::config::TransmitterConfig;
use crate::client::correlator::Correlator;
use crate::client::error::{SmppError, SmppResult};
use crate::client::keepalive;
use crate::codec::{Frame, PduHeader};
use crate::connection::{self, ConnectionError, FrameReader, FrameWriter};
use crate::datatypes::{CommandId, CommandStatus};
use crate::pdu::Pdu;
use crate::registry::FieldTag;
use std::io;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{Mutex, MutexGuard, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

/// Called once when a session that reached `Bound` is torn down
pub(crate) type OnClose = Box<dyn Fn() + Send + Sync>;

/// Sequence numbers 1..=0x7FFF_FFFF, wrapping back to 1.
#[derive(Debug)]
pub(crate) struct SequenceCounter {
    next: u32,
}

impl SequenceCounter {
    pub const MAX: u32 = 0x7FFF_FFFF;

    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next(&mut self) -> u32 {
        let sequence_number = self.next;
        self.next = if sequence_number >= Self::MAX {
            1
        } else {
            sequence_number + 1
        };
        sequence_number
    }
}

// Sequence assignment and the write share one lock so frames never interleave
// and numbers hit the wire in order.
struct Outbound {
    writer: Option<FrameWriter<OwnedWriteHalf>>,
    sequence: SequenceCounter,
}

pub(crate) struct Session {
    config: TransmitterConfig,
    outbound: Mutex<Outbound>,
    correlator: Correlator,
    bound: AtomicBool,
    closed: AtomicBool,
    halt: watch::Sender<bool>,
    on_close: OnClose,
}

/// Resolves once `halt` fires or its sender is gone.
pub(crate) async fn halted(halt: &mut watch::Receiver<bool>) {
    while !*halt.borrow_and_update() {
        if halt.changed().await.is_err() {
            return;
        }
    }
}

impl Session {
    /// Dials the SMSC, starts the background tasks and performs the bind.
    ///
    /// On any failure the half-built session is torn down before returning.
    pub(crate) async fn establish(
        config: TransmitterConfig,
        on_close: OnClose,
    ) -> SmppResult<Arc<Session>> {
        info!(addr = %config.addr, "connecting to SMSC");

        let socket = tokio::time::timeout(config.connect_timeout, TcpStream::connect(&config.addr))
            .await
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect to {} timed out", config.addr),
                )
            })??;
        if let Err(e) = socket.set_nodelay(true) {
            debug!("failed to set TCP_NODELAY: {e}");
        }

        let (reader, writer) = connection::split(socket);
        let (halt, _) = watch::channel(false);

        let session = Arc::new(Session {
            config,
            outbound: Mutex::new(Outbound {
                writer: Some(writer),
                sequence: SequenceCounter::new(),
            }),
            correlator: Correlator::new(),
            bound: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            halt,
            on_close,
        });

        tokio::spawn(session.clone().read_loop(reader, session.halt.subscribe()));
        tokio::spawn(session.clone().sweep_loop(session.halt.subscribe()));

        let credentials = &session.config.credentials;
        let bind = session
            .exchange(
                |seq| {
                    Pdu::bind_transmitter(
                        seq,
                        &credentials.system_id,
                        &credentials.password,
                        credentials.system_type_or_default(),
                    )
                },
                session.config.bind_timeout,
            )
            .await;

        match bind {
            Ok(response) => {
                session.bound.store(true, Ordering::SeqCst);
                info!(
                    system_id = response.str_field(FieldTag::SystemId).unwrap_or_default(),
                    "bound as transmitter"
                );

                if session.config.keep_alive.enabled {
                    tokio::spawn(keepalive::run(
                        session.clone(),
                        session.config.keep_alive.clone(),
                        session.halt.subscribe(),
                    ));
                }
                Ok(session)
            }
            Err(e) => {
                let e = match e {
                    SmppError::Command { status, .. } => SmppError::BindRejected(status),
                    other => other,
                };
                warn!("bind failed: {e}");
                session.teardown(false, || SmppError::SessionClosed).await;
                Err(e)
            }
        }
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.bound.load(Ordering::SeqCst) && !self.closed.load(Ordering::SeqCst)
    }

    /// Sends a request built around a fresh sequence number and waits for
    /// its response. Requires a live session.
    pub(crate) async fn request(
        &self,
        build: impl FnOnce(u32) -> Pdu,
        timeout: Duration,
    ) -> SmppResult<Pdu> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SmppError::SessionClosed);
        }
        self.exchange(build, timeout).await
    }

    /// Request/response round trip without the liveness check, used for
    /// bind and unbind.
    ///
    /// `timeout` covers the whole round trip: waiting for the writer, the
    /// write itself and the response.
    async fn exchange(
        &self,
        build: impl FnOnce(u32) -> Pdu,
        timeout: Duration,
    ) -> SmppResult<Pdu> {
        let deadline = Instant::now() + timeout;
        let mut halt = self.halt.subscribe();

        let (request_id, pending) = {
            let mut outbound = self.lock_outbound(&mut halt, deadline).await?;
            let Outbound { writer, sequence } = &mut *outbound;
            let writer = writer.as_mut().ok_or(SmppError::SessionClosed)?;

            let sequence_number = sequence.next();
            let request = build(sequence_number);
            let pending = self.correlator.register(sequence_number, deadline)?;

            debug!(
                command_id = %request.command_id,
                sequence_number,
                "sending request"
            );

            if let Err(e) = self.write(writer, &request, &mut halt, deadline).await {
                self.correlator.cancel(sequence_number);
                return Err(e);
            }

            (request.command_id, pending)
        };

        let response = pending.wait().await?;

        if !response.command_status.is_ok() {
            return Err(SmppError::Command {
                command_id: request_id,
                status: response.command_status,
                code: response.status_code(),
            });
        }

        // response() is always Some for requests this session sends
        let expected = request_id.response().unwrap_or(CommandId::GenericNack);
        if response.command_id != expected {
            return Err(SmppError::UnexpectedResponse {
                expected,
                actual: response.command_id,
            });
        }

        Ok(response)
    }

    /// Writes a PDU that expects no response (answers to SMSC requests).
    async fn send(&self, pdu: &Pdu) -> SmppResult<()> {
        let deadline = Instant::now() + self.config.request_timeout;
        let mut halt = self.halt.subscribe();

        let mut outbound = self.lock_outbound(&mut halt, deadline).await?;
        let writer = outbound.writer.as_mut().ok_or(SmppError::SessionClosed)?;
        self.write(writer, pdu, &mut halt, deadline).await
    }

    /// Waits for the writer, giving up once the session halts or `deadline`
    /// passes.
    async fn lock_outbound(
        &self,
        halt: &mut watch::Receiver<bool>,
        deadline: Instant,
    ) -> SmppResult<MutexGuard<'_, Outbound>> {
        tokio::select! {
            biased;
            _ = halted(halt) => Err(SmppError::SessionClosed),
            outbound = self.outbound.lock() => Ok(outbound),
            _ = tokio::time::sleep_until(deadline) => Err(SmppError::Timeout),
        }
    }

    /// Writes one PDU under the outbound lock.
    ///
    /// A write cut short leaves a partial frame on the wire, so a write that
    /// stalls past `deadline` fails the whole session, as does any transport
    /// error.
    async fn write(
        &self,
        writer: &mut FrameWriter<OwnedWriteHalf>,
        pdu: &Pdu,
        halt: &mut watch::Receiver<bool>,
        deadline: Instant,
    ) -> SmppResult<()> {
        let written = tokio::select! {
            biased;
            _ = halted(halt) => return Err(SmppError::SessionClosed),
            written = tokio::time::timeout_at(deadline, writer.write_pdu(pdu)) => written,
        };

        match written {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                if e.is_fatal() {
                    // The reader tears the session down once halted.
                    error!("write failed, closing session: {e}");
                    self.halt.send_replace(true);
                }
                Err(e.into())
            }
            Err(_) => {
                error!(
                    command_id = %pdu.command_id,
                    "SMSC stopped reading, closing session"
                );
                self.halt.send_replace(true);
                Err(SmppError::Timeout)
            }
        }
    }

    /// Caller initiated close: unbind if bound, then tear down.
    pub(crate) async fn close(&self) {
        self.teardown(true, || SmppError::SessionClosed).await;
    }

    /// Idempotent teardown. Every pending request is failed with `reason`.
    ///
    /// Never call with `unbind` from the reader task: the unbind_resp could
    /// not be read.
    pub(crate) async fn teardown(&self, unbind: bool, reason: impl Fn() -> SmppError) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let was_bound = self.bound.swap(false, Ordering::SeqCst);

        let failed = self.correlator.fail_all(&reason);
        if failed > 0 {
            debug!(failed, "failed pending requests on close");
        }

        if unbind && was_bound {
            let timeout = self.config.unbind_timeout;
            match tokio::time::timeout(timeout, self.exchange(Pdu::unbind, timeout)).await {
                Ok(Ok(_)) => debug!("unbind acknowledged"),
                Ok(Err(e)) => debug!("unbind failed: {e}"),
                Err(_) => debug!("unbind timed out"),
            }
        }

        // Every writer gives up the lock once halted.
        self.halt.send_replace(true);

        let writer = self.outbound.lock().await.writer.take();
        if let Some(mut writer) = writer {
            match tokio::time::timeout(self.config.unbind_timeout, writer.shutdown()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!("error shutting down writer: {e}"),
                Err(_) => debug!("writer shutdown timed out, dropping the socket"),
            }
        }

        // Anything registered while the unbind was in flight.
        self.correlator.fail_all(&reason);

        info!("session closed");
        if was_bound {
            (self.on_close)();
        }
    }

    /// Synchronous teardown for drop paths: no unbind, tasks are signalled
    /// and the socket closes once they release the session.
    pub(crate) fn halt_now(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.bound.store(false, Ordering::SeqCst);
        self.correlator.fail_all(|| SmppError::SessionClosed);
        self.halt.send_replace(true);
    }

    async fn read_loop<R>(self: Arc<Self>, mut reader: FrameReader<R>, mut halt: watch::Receiver<bool>)
    where
        R: AsyncRead + Unpin,
    {
        loop {
            tokio::select! {
                _ = halted(&mut halt) => break,
                read = reader.read_frame() => match read {
                    Ok(Some(frame)) => {
                        if self.dispatch(frame).await.is_break() {
                            break;
                        }
                    }
                    Ok(None) => {
                        warn!("SMSC closed the connection");
                        break;
                    }
                    Err(ConnectionError::Malformed { header, source }) => {
                        warn!(
                            sequence_number = header.sequence_number,
                            "discarding malformed PDU: {source}"
                        );
                        if !header.is_response() {
                            self.reject(&header, source.to_command_status()).await;
                        }
                    }
                    Err(e) if !e.is_fatal() => warn!("{e}"),
                    Err(e) => {
                        error!("connection failed: {e}");
                        break;
                    }
                },
            }
        }

        // No-op when the session was already closed elsewhere.
        self.teardown(false, || SmppError::ConnectionClosed).await;
    }

    async fn dispatch(&self, frame: Frame) -> ControlFlow<()> {
        let pdu = match frame {
            Frame::Pdu(pdu) => pdu,
            Frame::Unknown { header, .. } => {
                if !header.is_response() {
                    self.reply(Pdu::generic_nack(
                        header.sequence_number,
                        CommandStatus::InvalidCommandId,
                    ))
                    .await;
                }
                return ControlFlow::Continue(());
            }
        };

        trace!(
            command_id = %pdu.command_id,
            sequence_number = pdu.sequence_number,
            "received PDU"
        );

        if pdu.is_response() {
            self.correlator.resolve(pdu.sequence_number, pdu);
            return ControlFlow::Continue(());
        }

        match pdu.command_id {
            CommandId::EnquireLink | CommandId::DeliverSm => {
                if let Some(response) = pdu.response(CommandStatus::Ok) {
                    self.reply(response).await;
                }
                ControlFlow::Continue(())
            }
            CommandId::Unbind => {
                info!("SMSC requested unbind");
                if let Some(response) = pdu.response(CommandStatus::Ok) {
                    self.reply(response).await;
                }
                ControlFlow::Break(())
            }
            other => {
                warn!("unexpected {other} from SMSC, answering generic_nack");
                self.reply(Pdu::generic_nack(
                    pdu.sequence_number,
                    CommandStatus::InvalidCommandId,
                ))
                .await;
                ControlFlow::Continue(())
            }
        }
    }

    /// Answers an undecodable request with its own response type carrying
    /// `status`, or generic_nack when the command is not known.
    async fn reject(&self, header: &PduHeader, status: CommandStatus) {
        let response = match header.command().and_then(|id| id.response()) {
            Some(command_id) => Pdu::new(command_id, header.sequence_number).with_status(status),
            None => Pdu::generic_nack(header.sequence_number, status),
        };
        self.reply(response).await;
    }

    async fn reply(&self, pdu: Pdu) {
        if let Err(e) = self.send(&pdu).await {
            warn!(command_id = %pdu.command_id, "failed to answer SMSC: {e}");
        }
    }

    async fn sweep_loop(self: Arc<Self>, mut halt: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.expiry_sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = halted(&mut halt) => return,
                _ = ticker.tick() => {
                    self.correlator.expire(Instant::now());
                }
            }
        }
    }
}
