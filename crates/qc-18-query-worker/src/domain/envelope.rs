//! Request and response envelopes.
//!
//! Only the envelope is defined here. Bodies are opaque to the worker and
//! interpreted by the matched handler.
//!
//! ## Wire Layout
//!
//! ```text
//! request:  route | command | correlation_id (u32 LE) | body
//! response: route | command | correlation_id (u32 LE) | status (u32 LE) ++ body
//! ```
//!
//! The dealer adds no delimiter frame. The route frame is always first and is
//! empty when the message is not addressed to a specific peer, so the route of
//! a malformed message is still known.

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::config::Security;
use crate::error::{DecodeError, TransportError};

/// One multipart message as carried by the dealer.
pub type Frames = Vec<Bytes>;

/// Size of the correlation and status frames.
const CODE_SIZE: usize = 4;

/// Opaque transport identity of the originating peer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Route(Bytes);

impl Route {
    pub fn new(identity: impl Into<Bytes>) -> Self {
        Self(identity.into())
    }

    /// A route addressing no specific peer.
    pub fn empty() -> Self {
        Self(Bytes::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("[unrouted]")
        } else {
            f.write_str(&hex::encode(&self.0))
        }
    }
}

/// Handler-defined failure code.
///
/// Never one of the codes reserved by [`Status`], so a failure cannot reach a
/// client as success, not found or bad stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FailureCode(u32);

impl FailureCode {
    /// Returns `None` for a reserved code.
    pub fn new(code: u32) -> Option<Self> {
        (!Status::is_reserved(code)).then_some(Self(code))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Response status carried in the first four bytes of the payload frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    /// Unknown or obsoleted command.
    NotFound,
    /// Malformed or unreadable request.
    BadStream,
    /// Handler-defined failure.
    Failure(FailureCode),
}

impl Status {
    pub const SUCCESS_CODE: u32 = 0;
    pub const NOT_FOUND_CODE: u32 = 3;
    pub const BAD_STREAM_CODE: u32 = 4;

    /// Whether `code` has a fixed meaning and cannot carry a handler failure.
    pub fn is_reserved(code: u32) -> bool {
        matches!(
            code,
            Self::SUCCESS_CODE | Self::NOT_FOUND_CODE | Self::BAD_STREAM_CODE
        )
    }

    /// Handler failure status, or `None` for a reserved code.
    pub fn failure(code: u32) -> Option<Self> {
        FailureCode::new(code).map(Self::Failure)
    }

    pub fn code(&self) -> u32 {
        match self {
            Self::Success => Self::SUCCESS_CODE,
            Self::NotFound => Self::NOT_FOUND_CODE,
            Self::BadStream => Self::BAD_STREAM_CODE,
            Self::Failure(code) => code.get(),
        }
    }

    pub fn from_code(code: u32) -> Self {
        match code {
            Self::SUCCESS_CODE => Self::Success,
            Self::NOT_FOUND_CODE => Self::NotFound,
            Self::BAD_STREAM_CODE => Self::BadStream,
            other => Self::Failure(FailureCode(other)),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Decoded inbound query.
///
/// Built fresh per message and never mutated after decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    route: Route,
    command: String,
    correlation_id: u32,
    body: Bytes,
    security: Security,
}

impl Request {
    pub fn new(
        route: Route,
        command: impl Into<String>,
        correlation_id: u32,
        body: impl Into<Bytes>,
        security: Security,
    ) -> Self {
        Self {
            route,
            command: command.into(),
            correlation_id,
            body: body.into(),
            security,
        }
    }

    /// Decode a multipart message received on a channel of the given trust domain.
    ///
    /// Decoding is progressive: the route, command and correlation id are
    /// recovered in frame order and whatever was recovered before the failing
    /// check is kept in the error, so the rejection can still be addressed to
    /// the sender.
    pub fn decode(frames: Frames, security: Security) -> Result<Self, MalformedRequest> {
        let count = frames.len();
        let Some((route, rest)) = frames.split_first() else {
            return Err(MalformedRequest::new(
                Route::empty(),
                String::new(),
                0,
                DecodeError::FrameCount(count),
            ));
        };
        let route = Route::new(route.clone());

        let command = match rest.first().map(|frame| std::str::from_utf8(frame)) {
            Some(Ok(command)) => command.to_string(),
            Some(Err(_)) => {
                return Err(MalformedRequest::new(
                    route,
                    String::new(),
                    0,
                    DecodeError::InvalidCommand,
                ))
            }
            None => {
                return Err(MalformedRequest::new(
                    route,
                    String::new(),
                    0,
                    DecodeError::FrameCount(count),
                ))
            }
        };

        let correlation_id = match rest.get(1) {
            Some(frame) => match decode_code(frame) {
                Some(id) => id,
                None => {
                    return Err(MalformedRequest::new(
                        route,
                        command,
                        0,
                        DecodeError::InvalidCorrelationId(frame.len()),
                    ))
                }
            },
            None => {
                return Err(MalformedRequest::new(
                    route,
                    command,
                    0,
                    DecodeError::FrameCount(count),
                ))
            }
        };

        let [_, _, body] = rest else {
            return Err(MalformedRequest::new(
                route,
                command,
                correlation_id,
                DecodeError::FrameCount(count),
            ));
        };

        Ok(Self {
            route,
            command,
            correlation_id,
            body: body.clone(),
            security,
        })
    }

    /// Encode as a client would send it.
    pub fn encode(&self) -> Frames {
        let mut frames = Vec::with_capacity(4);
        frames.push(self.route.0.clone());
        frames.push(Bytes::copy_from_slice(self.command.as_bytes()));
        frames.push(Bytes::copy_from_slice(&self.correlation_id.to_le_bytes()));
        frames.push(self.body.clone());
        frames
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn correlation_id(&self) -> u32 {
        self.correlation_id
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Trust domain of the channel the request arrived on.
    pub fn security(&self) -> Security {
        self.security
    }
}

/// A message that could not be read or decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRequest {
    route: Route,
    command: String,
    correlation_id: u32,
    error: DecodeError,
}

impl MalformedRequest {
    fn new(route: Route, command: String, correlation_id: u32, error: DecodeError) -> Self {
        Self {
            route,
            command,
            correlation_id,
            error,
        }
    }

    /// The transport failed before any frame was read.
    pub fn unreadable(error: TransportError) -> Self {
        Self::new(Route::empty(), String::new(), 0, DecodeError::Unreadable(error))
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Recovered correlation id, zero if the frame was missing or unreadable.
    pub fn correlation_id(&self) -> u32 {
        self.correlation_id
    }

    pub fn error(&self) -> &DecodeError {
        &self.error
    }
}

/// Outbound reply to exactly one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    route: Route,
    command: String,
    correlation_id: u32,
    status: Status,
    body: Bytes,
}

impl Response {
    /// Successful reply carrying the handler's result.
    pub fn success(request: &Request, body: impl Into<Bytes>) -> Self {
        Self {
            route: request.route.clone(),
            command: request.command.clone(),
            correlation_id: request.correlation_id,
            status: Status::Success,
            body: body.into(),
        }
    }

    /// Handler-defined failure. The body is always empty.
    pub fn failure(request: &Request, code: FailureCode) -> Self {
        Self::empty(request, Status::Failure(code))
    }

    /// `NotFound` reply for an unknown or obsoleted command.
    pub fn not_found(request: &Request) -> Self {
        Self::empty(request, Status::NotFound)
    }

    fn empty(request: &Request, status: Status) -> Self {
        Self {
            route: request.route.clone(),
            command: request.command.clone(),
            correlation_id: request.correlation_id,
            status,
            body: Bytes::new(),
        }
    }

    /// `BadStream` reply addressed with whatever the decoder recovered.
    pub fn malformed(request: &MalformedRequest) -> Self {
        Self {
            route: request.route.clone(),
            command: request.command.clone(),
            correlation_id: request.correlation_id,
            status: Status::BadStream,
            body: Bytes::new(),
        }
    }

    pub fn encode(&self) -> Frames {
        let mut payload = BytesMut::with_capacity(CODE_SIZE + self.body.len());
        payload.put_u32_le(self.status.code());
        payload.put_slice(&self.body);

        vec![
            self.route.0.clone(),
            Bytes::copy_from_slice(self.command.as_bytes()),
            Bytes::copy_from_slice(&self.correlation_id.to_le_bytes()),
            payload.freeze(),
        ]
    }

    /// Decode a response as a client would receive it.
    pub fn decode(frames: Frames) -> Result<Self, DecodeError> {
        let [route, command, correlation, payload] = frames.as_slice() else {
            return Err(DecodeError::FrameCount(frames.len()));
        };
        let route = Route::new(route.clone());

        let command = std::str::from_utf8(command)
            .map_err(|_| DecodeError::InvalidCommand)?
            .to_string();
        let correlation_id = decode_code(correlation)
            .ok_or(DecodeError::InvalidCorrelationId(correlation.len()))?;
        if payload.len() < CODE_SIZE {
            return Err(DecodeError::InvalidStatus(payload.len()));
        }
        let status = decode_code(&payload[..CODE_SIZE])
            .map(Status::from_code)
            .ok_or(DecodeError::InvalidStatus(payload.len()))?;

        Ok(Self {
            route,
            command,
            correlation_id,
            status,
            body: payload.slice(CODE_SIZE..),
        })
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn correlation_id(&self) -> u32 {
        self.correlation_id
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

fn decode_code(frame: &[u8]) -> Option<u32> {
    let bytes: [u8; CODE_SIZE] = frame.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}
