//! # QFT (QUIC-like Flow Transfer)
//!
//! UDP 기반 멀티플로우 파일 전송 학습용 프로토콜
//!
//! ## 핵심 특징
//! - **롱/숏 헤더**: 연결 수립은 롱 헤더 1회, 이후 모든 트래픽은 숏 헤더
//! - **멀티플로우**: 한 연결 안에서 독립 논리 스트림 여러 개를 다중화
//! - **고정 페이싱**: 패킷마다 고정 지연을 넣는 정적 속도 제한 (적응형 아님)
//! - **관찰용 ACK**: ACK는 기록만 하고 재전송을 유발하지 않음
//! - **암시적 완료**: 종료 신호 없이 양측이 아는 크기 도달로 완료 판정

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod flow;
pub mod packet;
pub mod server;
pub mod stats;

pub use client::Client;
pub use config::Config;
pub use connection::{AckEvent, Connection, ConnectionRegistry};
pub use error::{Error, Result};
pub use flow::{Flow, FlowId, SendFlow};
pub use packet::{LongHeader, ShortHeader};
pub use server::Server;
pub use stats::TransferReport;

/// 기본 서버 주소
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:4433";

/// 연결당 플로우 수 (양측이 공유하는 암시적 계약)
pub const DEFAULT_NUM_FLOWS: u32 = 3;

/// 플로우당 전송 크기 (바이트)
pub const DEFAULT_FLOW_SIZE: usize = 2 * 1024 * 1024; // 2MiB

/// 플로우별 청크 크기 하한 (바이트)
pub const MIN_CHUNK_SIZE: usize = 1000;

/// 플로우별 청크 크기 상한 (바이트)
pub const MAX_CHUNK_SIZE: usize = 2000;

/// 수신 버퍼 크기 (바이트)
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 2048;

/// 패킷 간 페이싱 지연 (마이크로초)
pub const DEFAULT_PACING_DELAY_US: u64 = 400;

/// 생성되는 연결 ID / 패킷 번호의 상한 (하한은 1)
pub const MAX_GENERATED_ID: u32 = 1_000_000;
