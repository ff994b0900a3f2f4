use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, instrument, warn};

use crate::config::{ClientConfig, PingConfig, TransportConfig, DEFAULT_PORT, DEFAULT_PROTOCOL_VERSION};
use crate::core::codec::{flush_packets, framed, read_packet, write_packet, PacketStream};
use crate::core::varint::var_u32_len;
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::response::verify_json;
use crate::protocol::status::{Handshake, Ping, Serverbound, StatusRequest, StatusResponse};
use crate::transport::connection::Connection;
use crate::transport::srv::resolve_target;
use crate::utils::cancel::{abortable, CancelContext, CancelHandle};
use crate::utils::metrics::{global_metrics, Metrics, Timer};
use crate::utils::timeout::deadline;

/// Longest hostname a handshake carries
const MAX_HOSTNAME_LEN: usize = 255;

/// Server to query. Immutable for the duration of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTarget {
    pub hostname: String,
    pub port: u16,
    pub protocol_version: i32,
    pub ignore_srv: bool,
}

impl QueryTarget {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            port: DEFAULT_PORT,
            protocol_version: DEFAULT_PROTOCOL_VERSION,
            ignore_srv: false,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_protocol_version(mut self, protocol_version: i32) -> Self {
        self.protocol_version = protocol_version;
        self
    }

    pub fn ignore_srv(mut self, ignore: bool) -> Self {
        self.ignore_srv = ignore;
        self
    }

    /// Whether an SRV record may redirect this target.
    pub fn wants_srv(&self) -> bool {
        self.port == DEFAULT_PORT && !self.ignore_srv
    }

    fn validate(&self) -> Result<()> {
        if self.hostname.is_empty() {
            return Err(ProtocolError::ConfigError("Hostname cannot be empty".to_string()));
        }
        if self.hostname.len() > MAX_HOSTNAME_LEN {
            return Err(ProtocolError::ConfigError(
                constants::ERR_TOO_LONG_HOSTNAME.to_string(),
            ));
        }
        Ok(())
    }
}

/// Parses `host`, `host:port`, `[v6]` or `[v6]:port`. A bare IPv6 address
/// is taken whole.
impl FromStr for QueryTarget {
    type Err = ProtocolError;

    fn from_str(address: &str) -> Result<Self> {
        let address = address.trim();
        let invalid = || ProtocolError::ConfigError(format!("Invalid server address: '{address}'"));

        let (host, port) = if let Some(rest) = address.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
            let port = match tail {
                "" => None,
                tail => Some(tail.strip_prefix(':').ok_or_else(invalid)?),
            };
            (host, port)
        } else {
            match address.rsplit_once(':') {
                Some((host, port)) if !host.contains(':') => (host, Some(port)),
                _ => (address, None),
            }
        };

        if host.is_empty() {
            return Err(invalid());
        }
        let port = match port {
            Some(port) => port.parse::<u16>().map_err(|_| invalid())?,
            None => DEFAULT_PORT,
        };
        Ok(Self::new(host).with_port(port))
    }
}

/// Arguments of a single [`server_list_ping`] call
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub target: QueryTarget,
    /// Caller-side cancellation
    pub cancel: Option<CancelHandle>,
    /// Overrides the configured timeout
    pub timeout: Option<Duration>,
}

impl QueryOptions {
    pub fn new(target: QueryTarget) -> Self {
        Self {
            target,
            cancel: None,
            timeout: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Query a server's status with default settings.
pub async fn server_list_ping(options: QueryOptions) -> Result<String> {
    StatusClient::default().query_with(&options).await
}

/// Server List Ping client.
///
/// Each query is independent: it opens its own connection, runs the
/// handshake/status/ping exchange, and closes the connection on every exit
/// path. One client can serve any number of concurrent queries.
#[derive(Debug, Clone, Default)]
pub struct StatusClient {
    config: ClientConfig,
    transport: TransportConfig,
    metrics: Option<Arc<Metrics>>,
}

impl StatusClient {
    pub fn new(config: &PingConfig) -> Self {
        Self {
            config: config.client.clone(),
            transport: config.transport.clone(),
            metrics: None,
        }
    }

    /// Record into `metrics` instead of the global collector.
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn metrics(&self) -> &Metrics {
        self.metrics.as_deref().unwrap_or_else(|| global_metrics())
    }

    /// A target for `hostname` carrying this client's defaults.
    pub fn target(&self, hostname: impl Into<String>) -> QueryTarget {
        QueryTarget::new(hostname)
            .with_port(self.config.default_port)
            .with_protocol_version(self.config.protocol_version)
            .ignore_srv(self.config.ignore_srv)
    }

    /// Query `target` with the configured timeout.
    pub async fn query(&self, target: &QueryTarget, cancel: Option<CancelHandle>) -> Result<String> {
        self.query_with(&QueryOptions {
            target: target.clone(),
            cancel,
            timeout: None,
        })
        .await
    }

    /// Query and return the status JSON text exactly as the server sent it.
    #[instrument(
        skip_all,
        fields(
            hostname = %options.target.hostname,
            port = options.target.port,
            protocol = options.target.protocol_version
        )
    )]
    pub async fn query_with(&self, options: &QueryOptions) -> Result<String> {
        let metrics = self.metrics();
        metrics.query_started();
        let _timer = Timer::start("status_query");

        let timeout = options.timeout.unwrap_or(self.config.timeout);
        let ctx = CancelContext::new(options.cancel.clone(), Some(timeout));

        let result = self.run(&options.target, &ctx).await;
        match &result {
            Ok(json) => {
                metrics.query_succeeded();
                debug!(bytes = json.len(), "Status query succeeded");
            }
            Err(e) => {
                metrics.query_failed(e);
                debug!(error = %e, "Status query failed");
            }
        }
        result
    }

    async fn run(&self, target: &QueryTarget, ctx: &CancelContext) -> Result<String> {
        target.validate()?;

        let (hostname, port) = if target.wants_srv() {
            let resolved =
                resolve_target(&self.config.srv_prefix, &target.hostname, target.port, Some(ctx))
                    .await;
            if resolved.0 != target.hostname || resolved.1 != target.port {
                self.metrics().srv_redirect();
            }
            resolved
        } else {
            (target.hostname.clone(), target.port)
        };

        deadline(Some(ctx), async {
            let stream = TcpStream::connect((hostname.as_str(), port)).await?;
            if self.transport.nodelay {
                if let Err(e) = stream.set_nodelay(true) {
                    warn!(error = %e, "Failed to set TCP_NODELAY");
                }
            }
            let handshake = Handshake::status(target.protocol_version, &hostname, port);
            self.query_over(stream, handshake, Some(ctx)).await
        })
        .await
    }

    /// Run the status exchange over an already-open stream.
    ///
    /// The stream is wrapped in a [`Connection`] that is closed before this
    /// returns, whatever the outcome. If `ctx` fires mid-exchange the
    /// connection is aborted so pending I/O fails immediately.
    pub async fn query_over<S>(
        &self,
        stream: S,
        handshake: Handshake<'_>,
        ctx: Option<&CancelContext>,
    ) -> Result<String>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.metrics().connection_opened();
        let on_close: Box<dyn FnOnce() + Send> = match self.metrics.clone() {
            Some(metrics) => Box::new(move || metrics.connection_closed()),
            None => Box::new(|| global_metrics().connection_closed()),
        };

        let conn = Connection::new(stream).on_close(on_close);
        let abort = conn.abort_handle();
        let mut packets = framed(conn, self.transport.max_packet_size);

        let result = abortable(ctx, || abort.abort(), self.exchange(&mut packets, &handshake)).await;
        packets.get_mut().close().await;
        result
    }

    async fn exchange<S>(
        &self,
        packets: &mut PacketStream<Connection<S>>,
        handshake: &Handshake<'_>,
    ) -> Result<String>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.send(packets, handshake).await?;
        self.send(packets, &StatusRequest).await?;
        self.send(packets, &Ping::default()).await?;
        flush_packets(packets).await?;

        let packet = read_packet(packets).await?.ok_or_else(|| {
            debug!("{}", constants::ERR_NO_RESPONSE);
            ProtocolError::UnexpectedEof
        })?;
        self.metrics().packet_received(packet.wire_len() as u64);

        let response = StatusResponse::decode(&packet)?;
        if self.config.verify_json {
            verify_json(&response.json)?;
        }
        Ok(response.json)
    }

    async fn send<S, P>(&self, packets: &mut PacketStream<Connection<S>>, packet: &P) -> Result<()>
    where
        S: AsyncWrite + Unpin,
        P: Serverbound,
    {
        let mut size = 0usize;
        write_packet(packets, |buf| {
            packet.encode(buf)?;
            size = buf.len();
            Ok(())
        })
        .await?;
        self.metrics()
            .packet_sent((var_u32_len(size as u32) + size) as u64);
        Ok(())
    }
}
