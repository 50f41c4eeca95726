//! 에러 타입 정의

use thiserror::Error;

/// QFT 프로토콜 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO 에러: {0}")]
    Io(#[from] std::io::Error),

    #[error("패킷 길이 부족: 최소 {required} 바이트 필요, {got} 바이트 수신")]
    MalformedPacket { required: usize, got: usize },

    #[error("완료된 플로우 없음: 통계를 계산할 수 없음")]
    NoCompletedFlows,
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, Error>;
