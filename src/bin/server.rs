//! QFT 서버 (송신자) - QUIC-like Flow Transfer
//!
//! 멀티플로우 UDP 파일 전송 학습용 프로토콜 서버
//! - 연결당 고정 개수의 플로우를 순서대로 끝까지 전송
//! - 패킷마다 고정 페이싱 지연 (정적 속도 제한)
//!
//! 사용법:
//!   cargo run --release --bin qft-server -- [OPTIONS]
//!
//! 예시:
//!   # 기본 실행 (127.0.0.1:4433, 플로우 3개 x 2MiB)
//!   cargo run --release --bin qft-server
//!
//!   # 플로우 5개, 페이싱 1ms
//!   cargo run --release --bin qft-server -- --flows 5 --pacing-us 1000

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use qft::{Config, Server};

fn parse_args() -> Config {
    let args: Vec<String> = std::env::args().collect();
    let mut config = Config::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" | "-b" => {
                if i + 1 < args.len() {
                    config.server_addr = args[i + 1].parse().expect("유효한 주소 필요");
                    i += 1;
                }
            }
            "--flows" => {
                if i + 1 < args.len() {
                    config.num_flows = args[i + 1].parse().expect("유효한 숫자 필요");
                    i += 1;
                }
            }
            "--flow-size" => {
                if i + 1 < args.len() {
                    config.flow_size = args[i + 1].parse().expect("유효한 숫자 필요");
                    i += 1;
                }
            }
            "--chunk-min" => {
                if i + 1 < args.len() {
                    config.min_chunk_size = args[i + 1].parse().expect("유효한 숫자 필요");
                    i += 1;
                }
            }
            "--chunk-max" => {
                if i + 1 < args.len() {
                    config.max_chunk_size = args[i + 1].parse().expect("유효한 숫자 필요");
                    i += 1;
                }
            }
            "--pacing-us" => {
                if i + 1 < args.len() {
                    config.pacing_delay_us = args[i + 1].parse().expect("유효한 숫자 필요");
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!(
                    r#"QFT Server - QUIC-like Flow Transfer 서버

멀티플로우 UDP 파일 전송 학습용 프로토콜 서버
- 첫 롱 헤더 패킷으로 연결 수립, 이후 숏 헤더로 데이터 전송
- ACK는 기록만 하고 재전송하지 않음

사용법:
  cargo run --release --bin qft-server -- [OPTIONS]

옵션:
  -b, --bind <ADDR>     바인드 주소 (기본: 127.0.0.1:4433)
  --flows <N>           연결당 플로우 수 (기본: 3)
  --flow-size <BYTES>   플로우당 전송 크기 (기본: 2097152 = 2MiB)
  --chunk-min <BYTES>   청크 크기 하한 (기본: 1000)
  --chunk-max <BYTES>   청크 크기 상한 (기본: 2000)
  --pacing-us <US>      패킷 간 페이싱 지연 마이크로초 (기본: 400)
  -h, --help            이 도움말 출력

주의: --flows / --flow-size는 클라이언트와 같은 값이어야 한다.
와이어에서 협상되지 않는 공유 계약이다.
"#
                );
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    config
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 로깅 설정
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = parse_args();

    info!("QFT Server starting...");
    info!("Bind address: {}", config.server_addr);
    info!("Flows per connection: {}", config.num_flows);
    info!("Flow size: {} bytes", config.flow_size);
    info!(
        "Chunk size range: {}..={} bytes",
        config.min_chunk_size, config.max_chunk_size
    );
    info!("Pacing delay: {} us", config.pacing_delay_us);

    let mut server = Server::bind(config).await?;
    server.run().await?;

    Ok(())
}
