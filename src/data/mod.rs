//! This module contains everything relating to [Data].

mod forms;
mod support;

use std::collections::HashSet;
use std::hash::Hash;

use serenity::ChannelId;
use serenity::MessageId;
use serenity::UserId;
use tokio::sync::Mutex;
use tokio::sync::RwLock;

use crate::error::UserError;
use crate::serenity;
pub use forms::ApplicationForm;
pub use forms::ApplicationSettings;
pub use support::SupportType;
pub use support::TicketSettings;

/// The data kept between shards
#[derive(Debug, Default)]
pub struct Data {
    /// List of users to send bug notifications
    pub notify_list: HashSet<UserId>,
    /// Ticket panel and channel settings
    pub tickets: TicketSettings,
    /// Application forms and timeouts
    pub applications: ApplicationSettings,
    /// Where application submissions are posted, set at runtime by admins.
    response_channel: RwLock<Option<ChannelId>>,
    /// Tickets counting down to deletion.
    pub closing: Pending<ChannelId>,
    /// Submission messages a decision was made on.
    pub decided: Pending<MessageId>,
}

impl Data {
    /// Constructs [Data], seeding the response channel from `applications`.
    pub fn new(
        notify_list: HashSet<UserId>,
        tickets: TicketSettings,
        applications: ApplicationSettings,
    ) -> Self {
        let response_channel = RwLock::new(applications.response_channel);
        Self {
            notify_list,
            tickets,
            applications,
            response_channel,
            closing: Pending::default(),
            decided: Pending::default(),
        }
    }

    /// The current application response channel.
    pub async fn response_channel(&self) -> Result<ChannelId, UserError> {
        self.response_channel
            .read()
            .await
            .ok_or(UserError::ResponseChannelUnset)
    }

    /// Changes where application responses go. Not persisted across restarts.
    pub async fn set_response_channel(&self, channel: ChannelId) {
        *self.response_channel.write().await = Some(channel);
    }
}

/// Keys of actions that may only run once at a time.
#[derive(Debug)]
pub struct Pending<K>(Mutex<HashSet<K>>);

impl<K> Default for Pending<K> {
    fn default() -> Self {
        Self(Mutex::new(HashSet::new()))
    }
}

impl<K: Eq + Hash> Pending<K> {
    /// Marks `key` as started. `false` if it already was.
    pub async fn begin(&self, key: K) -> bool {
        self.0.lock().await.insert(key)
    }

    /// Marks `key` as finished so it can be started again.
    pub async fn end(&self, key: &K) {
        self.0.lock().await.remove(key);
    }
}

/// (De)serializes an optional discord id, with `""` standing in for `None`.
///
/// TOML has no null, so an empty string keeps the key visible in generated configs.
pub(crate) mod opt_id {
    use std::fmt::Display;
    use std::marker::PhantomData;

    use serde::de;
    use serde::Deserializer;
    use serde::Serializer;

    pub fn serialize<T, S>(val: &Option<T>, ser: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        match val {
            Some(v) => ser.serialize_str(&v.to_string()),
            None => ser.serialize_str(""),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: From<u64>,
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(OptIdVisitor(PhantomData))
    }

    struct OptIdVisitor<T>(PhantomData<T>);

    impl<T: From<u64>> OptIdVisitor<T> {
        fn from_u64<E: de::Error>(num: u64) -> Result<Option<T>, E> {
            if num == 0 {
                Err(E::custom("ids can't be 0"))
            } else {
                Ok(Some(T::from(num)))
            }
        }
    }

    impl<'de, T: From<u64>> de::Visitor<'de> for OptIdVisitor<T> {
        type Value = Option<T>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a discord id or an empty string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            match v.trim() {
                "" => Ok(None),
                s => {
                    let num: u64 = s.parse().map_err(|_| E::custom("not u64"))?;
                    Self::from_u64(num)
                }
            }
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Self::from_u64(v)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let num = u64::try_from(v).map_err(|_| E::custom("ids can't be negative"))?;
            Self::from_u64(num)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn response_channel_can_be_changed() {
        let data = Data::new(
            HashSet::new(),
            TicketSettings::default(),
            ApplicationSettings {
                response_channel: None,
                ..Default::default()
            },
        );
        assert!(matches!(
            data.response_channel().await,
            Err(UserError::ResponseChannelUnset)
        ));

        data.set_response_channel(ChannelId::new(42)).await;
        assert_eq!(data.response_channel().await.unwrap(), ChannelId::new(42));
    }

    #[tokio::test]
    async fn pending_keys_start_once() {
        let closing = Pending::default();
        let ticket = ChannelId::new(7);

        assert!(closing.begin(ticket).await);
        assert!(!closing.begin(ticket).await);
        assert!(closing.begin(ChannelId::new(8)).await);

        closing.end(&ticket).await;
        assert!(closing.begin(ticket).await);
    }

    #[test]
    fn opt_id_accepts_strings_integers_and_empty() {
        #[derive(serde::Deserialize)]
        struct Ids {
            #[serde(with = "opt_id", default)]
            a: Option<ChannelId>,
            #[serde(with = "opt_id", default)]
            b: Option<ChannelId>,
            #[serde(with = "opt_id", default)]
            c: Option<ChannelId>,
            #[serde(with = "opt_id", default)]
            d: Option<ChannelId>,
        }

        let ids: Ids = toml::from_str("a = \"123\"\nb = 456\nc = \"\"").unwrap();
        assert_eq!(ids.a, Some(ChannelId::new(123)));
        assert_eq!(ids.b, Some(ChannelId::new(456)));
        assert_eq!(ids.c, None);
        assert_eq!(ids.d, None);
    }

    #[test]
    fn opt_id_rejects_zero() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Ids {
            #[serde(with = "opt_id")]
            a: Option<ChannelId>,
        }

        assert!(toml::from_str::<Ids>("a = 0").is_err());
    }
}
