//! QFT 클라이언트 (수신자) - QUIC-like Flow Transfer
//!
//! 멀티플로우 UDP 파일 전송 학습용 프로토콜 클라이언트
//! - 롱 헤더 1회로 연결 수립, 이후 수신 패킷마다 ACK 회신
//! - 모든 플로우 수신 완료 후 플로우별/전체 통계 출력
//!
//! 사용법:
//!   cargo run --release --bin qft-client -- [OPTIONS]
//!
//! 예시:
//!   cargo run --release --bin qft-client -- --server 127.0.0.1:4433

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use qft::{Client, Config, TransferReport};

fn parse_args() -> Config {
    let args: Vec<String> = std::env::args().collect();
    let mut config = Config::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--server" | "-s" => {
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
            "--help" | "-h" => {
                println!(
                    r#"QFT Client - QUIC-like Flow Transfer 클라이언트

멀티플로우 UDP 파일 전송 학습용 프로토콜 클라이언트
- 수신 패킷마다 ACK 회신 (관찰용, 재전송 없음)
- 완료 후 플로우별/전체 데이터·패킷 속도 출력

사용법:
  cargo run --release --bin qft-client -- [OPTIONS]

옵션:
  -s, --server <ADDR>   서버 주소 (기본: 127.0.0.1:4433)
  --flows <N>           기대하는 플로우 수 (기본: 3)
  --flow-size <BYTES>   플로우당 기대 크기 (기본: 2097152 = 2MiB)
  -h, --help            이 도움말 출력

주의: --flows / --flow-size는 서버와 같은 값이어야 한다.
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

    info!("QFT Client starting...");
    info!("Server address: {}", config.server_addr);
    info!("Expected flows: {} x {} bytes", config.num_flows, config.flow_size);

    let mut client = Client::connect(config).await?;
    let flows = client.run().await?;

    let report = TransferReport::from_flows(&flows)?;
    println!("{}", report);

    Ok(())
}
