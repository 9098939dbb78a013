use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};
use tokio::runtime::Runtime;
use wisconet::{ClientConfig, HttpTransport, TransportError, Wisconet};

const STATIONS: usize = 10;
const HOURS: i64 = 24 * 30;
const FIELDS: [&str; 5] = [
    "60min_air_temp_f_avg",
    "60min_relative_humidity_pct_avg",
    "60min_pressure_mb_avg",
    "60min_wind_speed_mph_avg",
    "60min_rain_in_tot",
];
const START: i64 = 1_735_689_600; // 2025-01-01T00:00:00Z

/// Serves the same month of hourly data for every station.
struct Synthetic {
    stations: Value,
    measures: Value,
}

impl Synthetic {
    fn new() -> Self {
        let stations: Vec<Value> = (0..STATIONS)
            .map(|i| {
                json!({
                    "id": i,
                    "station_id": format!("S{i:03}"),
                    "station_name": format!("Station {i}"),
                    "latitude": 43.0 + i as f64 * 0.1,
                    "longitude": -89.0
                })
            })
            .collect();
        let fieldlist: Vec<Value> = FIELDS
            .iter()
            .enumerate()
            .map(|(id, name)| json!({"id": id, "standard_name": name, "final_units": "mb"}))
            .collect();
        let data: Vec<Value> = (0..HOURS)
            .map(|h| {
                // Reverse field order so the reshaper has sorting to do.
                let measures: Vec<Value> = (0..FIELDS.len())
                    .rev()
                    .map(|id| json!([id, h as f64 * 0.5]))
                    .collect();
                json!({"collection_time": START + h * 3600, "measures": measures})
            })
            .collect();
        Self {
            stations: Value::Array(stations),
            measures: json!({"fieldlist": fieldlist, "data": data}),
        }
    }
}

#[async_trait]
impl HttpTransport for Synthetic {
    async fn get_json(
        &self,
        route: &str,
        _query: &[(String, String)],
    ) -> Result<Value, TransportError> {
        if route == "/stations/" {
            Ok(self.stations.clone())
        } else {
            Ok(self.measures.clone())
        }
    }
}

fn bench_pipeline(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let client = rt
        .block_on(Wisconet::with_transport(
            std::sync::Arc::new(Synthetic::new()),
            ClientConfig::default(),
        ))
        .expect("client");
    let station_ids: Vec<String> = (0..STATIONS).map(|i| format!("S{i:03}")).collect();

    c.bench_function("get_data_10_stations_30_days", |b| {
        b.to_async(&rt).iter(|| async {
            client
                .get_data()
                .station_ids(black_box(station_ids.clone()))
                .start_time("2025-01-01")
                .end_time("2025-01-31")
                .fields(FIELDS)
                .call()
                .await
                .expect("data")
        })
    });

    let response = rt
        .block_on(
            client
                .get_data()
                .station_ids(station_ids.clone())
                .start_time("2025-01-01")
                .end_time("2025-01-31")
                .fields(FIELDS)
                .call(),
        )
        .expect("data");
    c.bench_function("to_records", |b| b.iter(|| black_box(response.table.to_records())));
    c.bench_function("to_dataframe", |b| {
        b.iter(|| black_box(response.table.to_dataframe().expect("frame")))
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
