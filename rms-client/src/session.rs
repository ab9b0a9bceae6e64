//! Stream session: connect, request, decode, emit.
//!
//! One session is one connection lifecycle: CONNECTING (transport + HTTP
//! request), STREAMING (the decode loop), then one of ENDED / ABORTED /
//! FAULTED. The loop is deliberately a plain `loop` over "read a chunk,
//! drain the framer" rather than anything recursive, and it does not ask
//! the transport for more bytes until every record extractable from the
//! current buffer has been dispatched, so a slow consumer throttles the
//! producer through the transport's own backpressure.
//!
//! The session never reconnects. It reports one classified fault and
//! stops; retry policy lives with the caller.

use crate::config::Config;
use crate::errors::StreamError;
use crate::http::{self, BodyReader};
use crate::messages::{StreamCommand, StreamEvent};
use crate::transport::{Transport, TransportRead};
use bytes::BytesMut;
use rms_codec::StreamDecoder;
use rms_protocol::RecordFramer;
use tokio::select;
use tokio::task::JoinHandle;

/// Establish the stream and spawn the decode loop.
///
/// Connection and request errors surface here, before anything is spawned;
/// mid-stream faults are delivered as [`StreamEvent::Fault`] followed by
/// [`StreamEvent::Closed`].
pub async fn spawn(
    config: Config,
    commands: flume::Receiver<StreamCommand>,
    events: flume::Sender<StreamEvent>,
) -> Result<JoinHandle<()>, StreamError> {
    let mut body = establish(&config).await?;
    let dims = config.dimensions();

    let _ = events.send(StreamEvent::Connected {
        width: dims.width,
        height: dims.height,
    });

    let handle = tokio::spawn(async move {
        let mut framer = RecordFramer::new(dims.raster_len());
        let mut decoder = StreamDecoder::new(dims);

        loop {
            select! {
                chunk = body.next_chunk() => {
                    match chunk {
                        Ok(Some(bytes)) => {
                            framer.push_chunk(&bytes);
                            if !drain_records(&mut framer, &mut decoder, &events).await {
                                return;
                            }
                        }
                        Ok(None) => {
                            // The producer closed cleanly, but nobody asked
                            // it to stop: upstream is gone.
                            report_fault(&events, &StreamError::StreamEnded).await;
                            return;
                        }
                        Err(e) => {
                            report_fault(&events, &e).await;
                            return;
                        }
                    }
                }

                cmd = commands.recv_async() => {
                    // Terminate, or the application dropped its handle.
                    // Either way: abandon the in-flight read, close the
                    // connection, say nothing but Closed.
                    match cmd {
                        Ok(StreamCommand::Terminate) | Err(_) => {
                            tracing::info!("stream terminated by consumer");
                            let _ = events.send_async(StreamEvent::Closed).await;
                            return;
                        }
                    }
                }
            }
        }
    });

    Ok(handle)
}

/// Connect the transport, send the request, and validate the response.
async fn establish(config: &Config) -> Result<BodyReader<TransportRead>, StreamError> {
    let host = &config.connection.host;
    let port = config.connection.port;

    let connect = async {
        match &config.security.tls {
            Some(settings) if settings.enabled => {
                Transport::connect_tls(host, port, settings).await
            }
            _ => Transport::connect_tcp(host, port).await,
        }
    };
    let transport = tokio::time::timeout(config.timeout(), connect)
        .await
        .map_err(|_| {
            StreamError::ConnectionFailed(format!(
                "timed out connecting to {}:{} after {:?}",
                host,
                port,
                config.timeout()
            ))
        })??;

    let (mut reader, mut writer) = transport.split();

    let host_header = format!("{}:{}", host, port);
    http::send_stream_request(
        &mut writer,
        &host_header,
        config.stream.rate_ms,
        config.security.auth_token.as_deref(),
    )
    .await?;

    let mut scratch = BytesMut::with_capacity(8192);
    let head = tokio::time::timeout(
        config.timeout(),
        http::read_response_head(&mut reader, &mut scratch),
    )
    .await
    .map_err(|_| {
        StreamError::ConnectionFailed("timed out waiting for response head".to_string())
    })??;

    match head.status {
        200..=299 => {}
        429 => return Err(StreamError::RateLimited),
        status => return Err(StreamError::Http { status }),
    }

    tracing::debug!(
        "stream response accepted: chunked={} content-type={:?}",
        head.is_chunked(),
        head.header("content-type")
    );

    Ok(BodyReader::new(reader, scratch, head.is_chunked()))
}

/// Pull every complete record out of the framer and emit decoded frames.
///
/// Returns false when the session should stop (wire violation or the
/// application hung up).
async fn drain_records(
    framer: &mut RecordFramer,
    decoder: &mut StreamDecoder,
    events: &flume::Sender<StreamEvent>,
) -> bool {
    loop {
        match framer.next_record() {
            Ok(Some(record)) => {
                let outcome = decoder.apply_record(&record);
                if let Some(frame) = outcome.frame {
                    if events
                        .send_async(StreamEvent::FrameReady { raster: frame })
                        .await
                        .is_err()
                    {
                        // Application is gone; nothing left to decode for.
                        return false;
                    }
                }
            }
            Ok(None) => return true,
            Err(wire) => {
                report_fault(events, &StreamError::Wire(wire)).await;
                return false;
            }
        }
    }
}

async fn report_fault(events: &flume::Sender<StreamEvent>, error: &StreamError) {
    tracing::error!("stream fault: {}", error);
    let _ = events
        .send_async(StreamEvent::Fault {
            class: error.classification(),
            message: error.to_string(),
            retryable: error.is_retryable(),
        })
        .await;
    let _ = events.send_async(StreamEvent::Closed).await;
}
