use redis::aio::MultiplexedConnection;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, Client};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{AutografError, AutografResult, ErrorKind};
use crate::stream::{EventStream, StreamMessage};
use crate::{autograf_error, bail};

/// Error code Redis returns when the consumer group already exists.
const BUSY_GROUP_CODE: &str = "BUSYGROUP";

/// Offset from which a newly created group starts reading.
const GROUP_START_ID: &str = "0";

/// Special id requesting messages never delivered to another consumer.
const NEW_MESSAGES_ID: &str = ">";

/// Id placeholder letting the stream assign the entry id on append.
const AUTO_ID: &str = "*";

/// Number of messages requested per read.
const READ_COUNT: usize = 1;

/// Redis-stream-backed [`EventStream`].
///
/// Thin pass-through over the stream commands. Reads block indefinitely until
/// a message is assigned to the consumer; this client is meant to be driven
/// from a single sequential loop.
#[derive(Debug, Clone)]
pub struct RedisStreamClient {
    connection: MultiplexedConnection,
}

impl RedisStreamClient {
    /// Connects to the stream store and verifies the connection with a PING.
    ///
    /// This is the only connectivity check the service performs up front; a
    /// failure here is fatal at startup.
    pub async fn connect(addr: &str) -> AutografResult<Self> {
        let client = Client::open(addr).map_err(|err| {
            autograf_error!(
                ErrorKind::StreamConnectionFailed,
                "invalid stream store address",
                err
            )
        })?;

        let mut connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|err| {
                autograf_error!(
                    ErrorKind::StreamConnectionFailed,
                    "unable to connect to the stream store",
                    err
                )
            })?;

        let _: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(|err| {
                autograf_error!(
                    ErrorKind::StreamConnectionFailed,
                    "stream store did not answer the connectivity check",
                    err
                )
            })?;

        Ok(Self { connection })
    }
}

impl EventStream for RedisStreamClient {
    async fn create_group(&self, stream: &str, group: &str) -> AutografResult<()> {
        let mut connection = self.connection.clone();

        let created: Result<String, redis::RedisError> = connection
            .xgroup_create_mkstream(stream, group, GROUP_START_ID)
            .await;

        match created {
            Ok(_) => Ok(()),
            Err(err) if err.code() == Some(BUSY_GROUP_CODE) => {
                // The group surviving a previous run is the normal case for a
                // restarted consumer.
                debug!(stream, group, "consumer group already exists");
                Ok(())
            }
            Err(err) => Err(autograf_error!(
                ErrorKind::StreamGroupCreationFailed,
                "failed to create the consumer group",
                err
            )),
        }
    }

    async fn read_group(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
    ) -> AutografResult<Vec<StreamMessage>> {
        let mut connection = self.connection.clone();

        let options = StreamReadOptions::default()
            .group(group, consumer)
            .count(READ_COUNT)
            // Block until at least one message is assigned to this consumer.
            .block(0);

        let reply: StreamReadReply = connection
            .xread_options(&[stream], &[NEW_MESSAGES_ID], &options)
            .await
            .map_err(|err| {
                autograf_error!(
                    ErrorKind::StreamReadFailed,
                    "failed to read from the stream",
                    err
                )
            })?;

        let mut messages = Vec::new();
        for key in reply.keys {
            for entry in key.ids {
                let mut fields = HashMap::new();
                for name in entry.map.keys() {
                    if let Some(value) = entry.get::<String>(name) {
                        fields.insert(name.clone(), value);
                    }
                }

                messages.push(StreamMessage {
                    id: entry.id.clone(),
                    fields,
                });
            }
        }

        Ok(messages)
    }

    async fn ack(&self, stream: &str, group: &str, message_id: &str) -> AutografResult<()> {
        let mut connection = self.connection.clone();

        let acknowledged: i64 = connection
            .xack(stream, group, &[message_id])
            .await
            .map_err(|err| {
                autograf_error!(
                    ErrorKind::StreamAckFailed,
                    "failed to acknowledge the message",
                    err
                )
            })?;

        if acknowledged == 0 {
            bail!(
                ErrorKind::StreamAckFailed,
                "message was not pending for this group",
                message_id
            );
        }

        Ok(())
    }

    async fn append(&self, stream: &str, fields: Vec<(String, Vec<u8>)>) -> AutografResult<String> {
        let mut connection = self.connection.clone();

        let id: String = connection
            .xadd(stream, AUTO_ID, &fields)
            .await
            .map_err(|err| {
                autograf_error!(
                    ErrorKind::StreamPublishFailed,
                    "failed to append the message to the stream",
                    err
                )
            })?;

        Ok(id)
    }
}
