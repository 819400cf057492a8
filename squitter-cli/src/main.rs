use std::{
    collections::HashMap,
    path::PathBuf,
    pin::Pin,
    time::{
        Duration,
        Instant,
    },
};

use clap::{
    Parser,
    Subcommand,
};
use color_eyre::eyre::{
    Error,
    bail,
};
use futures_util::StreamExt;
use serde::Serialize;
use squitter_beast as beast;
use squitter_mode_s::{
    self as mode_s,
    FieldError,
    cpr::{
        self,
        Cpr,
        Position,
    },
};
use squitter_types::{
    IcaoAddress,
    Squawk,
};
use tokio::{
    io::{
        AsyncRead,
        BufReader,
    },
    net::TcpStream,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let _ = dotenvy::dotenv();
    color_eyre::install()?;
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    match args.command {
        Command::Decode {
            messages,
            reference,
            json,
        } => {
            let mut message_processor = MessageProcessor::new(reference.position()?, json);
            for message in &messages {
                let data = hex::decode(message.trim())?;
                message_processor.handle_mode_s_data(&data, None)?;
            }
        }
        Command::Beast(args) => {
            let mut message_processor = MessageProcessor::new(args.reference.position()?, args.json);

            args.run(|frame| {
                match frame.payload {
                    beast::Payload::ModeAc(data) => {
                        tracing::debug!(data = ?data, "mode a/c");
                        Ok(())
                    }
                    beast::Payload::ModeSShort(data) => {
                        message_processor.handle_mode_s_data(&data, Some(&frame))
                    }
                    beast::Payload::ModeSLong(data) => {
                        message_processor.handle_mode_s_data(&data, Some(&frame))
                    }
                }
            })
            .await?;

            message_processor.finish();
        }
    }

    Ok(())
}

#[derive(Debug, Parser)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decode hex-encoded Mode S messages.
    Decode {
        #[clap(required = true)]
        messages: Vec<String>,

        #[clap(flatten)]
        reference: ReferenceArgs,

        /// Print one JSON object per message.
        #[clap(short, long)]
        json: bool,
    },
    /// Read a BEAST stream from a TCP connection or a file.
    Beast(ClientArgs),
}

#[derive(Debug, clap::Args)]
struct ReferenceArgs {
    /// Latitude of the receiver, used for local CPR decoding.
    #[clap(long, env = "REFERENCE_LATITUDE", allow_hyphen_values = true)]
    reference_latitude: Option<f64>,

    /// Longitude of the receiver, used for local CPR decoding.
    #[clap(long, env = "REFERENCE_LONGITUDE", allow_hyphen_values = true)]
    reference_longitude: Option<f64>,
}

impl ReferenceArgs {
    fn position(&self) -> Result<Option<Position>, Error> {
        match (self.reference_latitude, self.reference_longitude) {
            (Some(latitude), Some(longitude)) => {
                let position = Position {
                    latitude,
                    longitude,
                };
                if !position.is_valid() {
                    bail!("Reference position out of range: {latitude}, {longitude}");
                }
                Ok(Some(position))
            }
            (None, None) => Ok(None),
            _ => bail!("Both --reference-latitude and --reference-longitude must be set."),
        }
    }
}

#[derive(Debug, clap::Args)]
struct ClientArgs {
    #[clap(short, long, env = "BEAST_ADDRESS")]
    address: Option<String>,

    #[clap(short, long, env = "BEAST_FILE")]
    file: Option<PathBuf>,

    /// Stop after this many frames.
    #[clap(short, long)]
    limit: Option<usize>,

    #[clap(flatten)]
    reference: ReferenceArgs,

    #[clap(short, long)]
    json: bool,
}

impl ClientArgs {
    pub async fn run<P>(&self, mut p: P) -> Result<(), Error>
    where
        P: FnMut(beast::Frame) -> Result<(), Error>,
    {
        let input: Pin<Box<dyn AsyncRead>> = match (&self.address, &self.file) {
            (Some(address), None) => Box::pin(TcpStream::connect(&address).await?),
            (None, Some(file)) => Box::pin(tokio::fs::File::open(&file).await?),
            (Some(_), Some(_)) => bail!("Only one of --address or --file can be used."),
            (None, None) => bail!("One of --address or --file is required."),
        };

        let mut reader = beast::Reader::new(BufReader::new(input));

        let mut i = 0;
        while let Some(result) = reader.next().await {
            match result {
                Ok(frame) => p(frame)?,
                Err(error) if error.is_recoverable() => {
                    tracing::debug!(%error, "skipping frame");
                    continue;
                }
                Err(error) => return Err(error.into()),
            }

            i += 1;
            if self.limit.is_some_and(|limit| i >= limit) {
                break;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct Record {
    downlink_format: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp_ns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    signal_level: Option<f32>,
    icao: Option<IcaoAddress>,
    valid: Option<bool>,
    type_code: Option<u8>,
    altitude: Option<i32>,
    squawk: Option<Squawk>,
    callsign: Option<String>,
    position: Option<PositionRecord>,
}

#[derive(Debug, Serialize)]
struct PositionRecord {
    latitude: f64,
    longitude: f64,
}

/// Discards fields the message doesn't carry and logs any other error.
fn field<T>(name: &'static str, result: Result<T, FieldError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            if !error.is_not_available() {
                tracing::debug!(field = name, %error, "invalid field");
            }
            None
        }
    }
}

/// Even and odd reports further apart than this are not paired.
const CPR_WINDOW: Duration = Duration::from_secs(10);

/// Number of reports between sweeps for idle aircraft.
const CPR_SWEEP_INTERVAL: usize = 1000;

#[derive(Debug)]
struct CprTrack {
    decoder: cpr::Decoder<Duration>,
    last_seen: Duration,
}

/// Per-aircraft CPR pairing.
#[derive(Debug, Default)]
struct CprTracker {
    tracks: HashMap<IcaoAddress, CprTrack>,
    num_reports: usize,
}

impl CprTracker {
    fn position(
        &mut self,
        icao: IcaoAddress,
        cpr: Cpr,
        time: Duration,
        reference: Option<Position>,
    ) -> Option<Position> {
        self.num_reports += 1;
        if self.num_reports % CPR_SWEEP_INTERVAL == 0 {
            self.sweep(time);
        }

        let track = self.tracks.entry(icao).or_insert_with(|| {
            CprTrack {
                decoder: Default::default(),
                last_seen: time,
            }
        });

        // the time source changed or the receiver clock was reset
        if time < track.last_seen {
            track.decoder.clear();
        }
        track.last_seen = time;

        track.decoder.expire(&time.saturating_sub(CPR_WINDOW));
        track.decoder.push(cpr, time, reference)
    }

    /// Drops aircraft that haven't reported a position within the window.
    fn sweep(&mut self, time: Duration) {
        let cutoff = time.saturating_sub(CPR_WINDOW);
        self.tracks
            .retain(|_, track| track.last_seen >= cutoff && track.last_seen <= time);
        tracing::trace!(num_aircraft = self.tracks.len(), "swept cpr tracks");
    }
}

#[derive(Debug)]
struct MessageProcessor {
    reference: Option<Position>,
    json: bool,
    cpr_tracker: CprTracker,
    t_start: Instant,
    num_frames: usize,
    num_bytes: usize,
    num_invalid: usize,
}

impl MessageProcessor {
    fn new(reference: Option<Position>, json: bool) -> Self {
        Self {
            reference,
            json,
            cpr_tracker: CprTracker::default(),
            t_start: Instant::now(),
            num_frames: 0,
            num_bytes: 0,
            num_invalid: 0,
        }
    }

    fn handle_mode_s_data(&mut self, data: &[u8], frame: Option<&beast::Frame>) -> Result<(), Error> {
        self.num_bytes += data.len();

        let message = match mode_s::Message::decode(data) {
            Ok(message) => message,
            Err(error) => {
                tracing::debug!(%error, data = %hex::encode(data), "invalid mode-s frame");
                self.num_invalid += 1;
                return Ok(());
            }
        };

        let valid = message.is_valid();
        if valid == Some(false) {
            tracing::trace!(parity = message.parity(), "parity check failed");
            self.num_invalid += 1;
            return Ok(());
        }

        self.num_frames += 1;

        let time = self.receive_time(frame);
        let icao = field("icao", message.icao());
        let position = icao
            .zip(field("cpr", message.cpr()))
            .and_then(|(icao, cpr)| self.cpr_tracker.position(icao, cpr, time, self.reference));

        let record = Record {
            downlink_format: message.downlink_format().as_u8(),
            timestamp_ns: frame.map(|frame| frame.timestamp.as_nanos()),
            signal_level: frame.map(|frame| frame.signal_level.decode()),
            icao,
            valid,
            type_code: field("type_code", message.type_code()),
            altitude: field("altitude", message.altitude()),
            squawk: field("squawk", message.squawk()),
            callsign: field("callsign", message.callsign()).map(|callsign| callsign.to_string()),
            position: position.map(|position| {
                PositionRecord {
                    latitude: position.latitude,
                    longitude: position.longitude,
                }
            }),
        };

        if self.json {
            println!("{}", serde_json::to_string(&record)?);
        }
        else {
            println!("{record:?}");
        }

        Ok(())
    }

    /// MLAT time of the frame if the receiver supplied one, otherwise time
    /// since start.
    fn receive_time(&self, frame: Option<&beast::Frame>) -> Duration {
        frame
            .map(|frame| frame.timestamp)
            .filter(|timestamp| {
                !timestamp.is_synthetic()
                    && *timestamp != beast::MlatTimestamp::ANY_TIMESTAMP
                    && timestamp.ticks() != 0
            })
            .map_or_else(|| self.t_start.elapsed(), |timestamp| timestamp.as_duration())
    }

    fn finish(self) {
        let t_elapsed = self.t_start.elapsed();
        eprintln!(
            "{} frames ({} invalid) and {} bytes in {t_elapsed:?}",
            self.num_frames, self.num_invalid, self.num_bytes
        );
        let seconds = t_elapsed.as_secs_f32();
        eprintln!(
            "{} frames/s, {} MB/s",
            self.num_frames as f32 / seconds,
            self.num_bytes as f32 / seconds / 1024.0 / 1024.0
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use squitter_mode_s::cpr::{
        Cpr,
        Format,
        Position,
    };
    use squitter_types::IcaoAddress;

    use super::{
        CPR_SWEEP_INTERVAL,
        CprTracker,
    };

    const POSITION: Position = Position {
        latitude: 52.2572,
        longitude: 3.9194,
    };

    fn icao() -> IcaoAddress {
        "40621d".parse().unwrap()
    }

    #[test]
    fn it_pairs_reports_within_the_window() {
        let mut tracker = CprTracker::default();
        let even = Cpr::encode(POSITION, Format::Even);
        let odd = Cpr::encode(POSITION, Format::Odd);

        assert!(tracker.position(icao(), even, Duration::from_secs(1), None).is_none());
        let position = tracker
            .position(icao(), odd, Duration::from_secs(2), None)
            .unwrap();
        approx::assert_abs_diff_eq!(position.latitude, POSITION.latitude, epsilon = 1e-3);
        approx::assert_abs_diff_eq!(position.longitude, POSITION.longitude, epsilon = 1e-3);
    }

    #[test]
    fn it_does_not_pair_stale_reports() {
        let mut tracker = CprTracker::default();
        let even = Cpr::encode(POSITION, Format::Even);
        let odd = Cpr::encode(POSITION, Format::Odd);

        assert!(tracker.position(icao(), even, Duration::from_secs(1), None).is_none());
        assert!(tracker.position(icao(), odd, Duration::from_secs(21), None).is_none());
    }

    #[test]
    fn it_forgets_reports_when_the_clock_goes_backwards() {
        let mut tracker = CprTracker::default();
        let even = Cpr::encode(POSITION, Format::Even);
        let odd = Cpr::encode(POSITION, Format::Odd);

        assert!(tracker.position(icao(), even, Duration::from_secs(100), None).is_none());
        assert!(tracker.position(icao(), odd, Duration::from_secs(1), None).is_none());
    }

    #[test]
    fn it_evicts_idle_aircraft() {
        let mut tracker = CprTracker::default();
        let even = Cpr::encode(POSITION, Format::Even);
        let other: IcaoAddress = "3c6586".parse().unwrap();

        tracker.position(other, even, Duration::from_secs(1), None);
        for i in 1..CPR_SWEEP_INTERVAL {
            let time = Duration::from_secs(100) + Duration::from_millis(i as u64);
            tracker.position(icao(), even, time, None);
        }
        assert!(!tracker.tracks.contains_key(&other));
        assert!(tracker.tracks.contains_key(&icao()));
    }
}
