use commonware_codec::{Error as CodecError, ReadExt, Write};
use commonware_cryptography::ed25519::PublicKey;
use puglands_execution::{State, Status};
use puglands_types::{
    economy::{Land, RedemptionRequest},
    execution::{Account, Key, Value},
    EconomyError,
};
use std::{
    collections::BTreeMap,
    fs::{self, File, OpenOptions},
    io::Write as _,
    path::{Path, PathBuf},
};
use tracing::{error, info, warn};

const SNAPSHOT_FILE: &str = "snapshot.bin";
const SNAPSHOT_TMP_FILE: &str = "snapshot.tmp";
const WAL_FILE: &str = "wal.bin";

/// The ledger store: a keyed in-memory table with snapshot + write-ahead
/// durability. A commit appends the changeset to the log and syncs it
/// before the table mutates, so either the whole operation is durably
/// recorded or nothing changed.
pub struct Store {
    data: BTreeMap<Key, Value>,
    wal: Option<File>,
}

impl Store {
    /// In-memory store with no durability (tests, dev runs without a
    /// storage directory).
    pub fn ephemeral() -> Self {
        Self {
            data: BTreeMap::new(),
            wal: None,
        }
    }

    /// Open (or create) the durable store under `directory`: load the last
    /// snapshot, replay the write-ahead log, then compact. A truncated
    /// trailing log record (crash mid-append) is discarded; it was never
    /// acknowledged.
    pub fn open(directory: PathBuf) -> anyhow::Result<Self> {
        fs::create_dir_all(&directory)?;

        let mut data = BTreeMap::new();

        let snapshot_path = directory.join(SNAPSHOT_FILE);
        if snapshot_path.exists() {
            let bytes = fs::read(&snapshot_path)?;
            let mut buf = &bytes[..];
            while !buf.is_empty() {
                let key = Key::read(&mut buf)
                    .map_err(|err| anyhow::anyhow!("corrupt snapshot: {err}"))?;
                let value = Value::read(&mut buf)
                    .map_err(|err| anyhow::anyhow!("corrupt snapshot: {err}"))?;
                data.insert(key, value);
            }
        }

        let wal_path = directory.join(WAL_FILE);
        if wal_path.exists() {
            let bytes = fs::read(&wal_path)?;
            let mut replayed = 0usize;
            let mut buf = &bytes[..];
            loop {
                if buf.is_empty() {
                    break;
                }
                let record = match read_record(&mut buf) {
                    Ok(Some(record)) => record,
                    Ok(None) => {
                        warn!("discarding truncated trailing wal record");
                        break;
                    }
                    Err(err) => {
                        warn!(?err, "discarding unreadable wal tail");
                        break;
                    }
                };
                for (key, status) in record {
                    match status {
                        Status::Update(value) => {
                            data.insert(key, value);
                        }
                        Status::Delete => {
                            data.remove(&key);
                        }
                    }
                }
                replayed += 1;
            }
            if replayed > 0 {
                info!(records = replayed, "replayed write-ahead log");
            }
        }

        // Fold the replayed log into a fresh snapshot and start the log
        // empty again.
        write_snapshot(&directory, &data)?;
        let wal = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&wal_path)?;
        wal.set_len(0)?;

        Ok(Self {
            data,
            wal: Some(wal),
        })
    }

    /// Durably record and apply one committed changeset. On an append
    /// failure nothing is applied and the log is rolled back to its
    /// previous length so a later commit cannot land behind a torn record.
    pub fn commit(&mut self, changes: Vec<(Key, Status)>) -> Result<(), EconomyError> {
        if let Some(wal) = &mut self.wal {
            let mut payload = Vec::new();
            (changes.len() as u32).write(&mut payload);
            for (key, status) in &changes {
                key.write(&mut payload);
                status.write(&mut payload);
            }
            let mut record = Vec::with_capacity(4 + payload.len());
            (payload.len() as u32).write(&mut record);
            record.extend_from_slice(&payload);

            let previous_len = wal.metadata().map(|meta| meta.len()).unwrap_or(0);
            if let Err(err) = wal.write_all(&record).and_then(|()| wal.sync_data()) {
                error!(?err, "failed to append changeset to write-ahead log");
                let _ = wal.set_len(previous_len);
                return Err(EconomyError::Unavailable);
            }
        }

        for (key, status) in changes {
            match status {
                Status::Update(value) => {
                    self.data.insert(key, value);
                }
                Status::Delete => {
                    self.data.remove(&key);
                }
            }
        }
        Ok(())
    }

    pub fn lands(&self) -> Vec<Land> {
        self.data
            .values()
            .filter_map(|value| match value {
                Value::Land(land) => Some(land.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn lands_of(&self, owner: &PublicKey) -> Vec<Land> {
        self.data
            .values()
            .filter_map(|value| match value {
                Value::Land(land) if &land.owner == owner => Some(land.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn account(&self, public: &PublicKey) -> Account {
        match self.data.get(&Key::Account(public.clone())) {
            Some(Value::Account(account)) => account.clone(),
            _ => Account::default(),
        }
    }

    pub fn redemption(&self, public: &PublicKey) -> Option<RedemptionRequest> {
        match self.data.get(&Key::Redemption(public.clone())) {
            Some(Value::Redemption(request)) => Some(request.clone()),
            _ => None,
        }
    }
}

impl State for Store {
    async fn get(&self, key: &Key) -> Option<Value> {
        self.data.get(key).cloned()
    }

    async fn insert(&mut self, key: Key, value: Value) {
        self.data.insert(key, value);
    }

    async fn delete(&mut self, key: &Key) {
        self.data.remove(key);
    }
}

/// Read one length-prefixed changeset record. `Ok(None)` means the buffer
/// ends inside the record (a torn tail).
fn read_record(buf: &mut &[u8]) -> Result<Option<Vec<(Key, Status)>>, CodecError> {
    if buf.len() < 4 {
        return Ok(None);
    }
    let len = u32::read(buf)? as usize;
    if buf.len() < len {
        return Ok(None);
    }
    let (mut record, rest) = buf.split_at(len);
    *buf = rest;

    let count = u32::read(&mut record)? as usize;
    let mut changes = Vec::with_capacity(count);
    for _ in 0..count {
        let key = Key::read(&mut record)?;
        let status = Status::read(&mut record)?;
        changes.push((key, status));
    }
    Ok(Some(changes))
}

fn write_snapshot(directory: &Path, data: &BTreeMap<Key, Value>) -> anyhow::Result<()> {
    let mut buf = Vec::new();
    for (key, value) in data {
        key.write(&mut buf);
        value.write(&mut buf);
    }

    let tmp_path = directory.join(SNAPSHOT_TMP_FILE);
    let mut tmp = File::create(&tmp_path)?;
    tmp.write_all(&buf)?;
    tmp.sync_all()?;
    drop(tmp);
    fs::rename(&tmp_path, directory.join(SNAPSHOT_FILE))?;

    Ok(())
}
