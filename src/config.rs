//! 프로토콜 설정
//!
//! 플로우 수와 플로우 크기는 와이어에서 협상되지 않고 양측이 미리 알아야
//! 하는 값이다. 리터럴 중복 대신 하나의 Config를 서버/클라이언트에 전달한다.

use std::net::SocketAddr;

use rand::Rng;

use crate::{
    DEFAULT_FLOW_SIZE, DEFAULT_NUM_FLOWS, DEFAULT_PACING_DELAY_US, DEFAULT_RECV_BUFFER_SIZE,
    DEFAULT_SERVER_ADDR, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE,
};

/// QFT 프로토콜 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// 서버 주소
    pub server_addr: SocketAddr,

    /// 연결당 플로우 수
    pub num_flows: u32,

    /// 플로우당 전송 크기 (바이트)
    pub flow_size: usize,

    /// 플로우별 청크 크기 하한 (바이트)
    pub min_chunk_size: usize,

    /// 플로우별 청크 크기 상한 (바이트)
    pub max_chunk_size: usize,

    /// 수신 버퍼 크기 (바이트)
    pub recv_buffer_size: usize,

    /// 패킷 간 페이싱 지연 (마이크로초)
    /// 0이면 지연 없이 전송
    pub pacing_delay_us: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_SERVER_ADDR.parse().unwrap(),
            num_flows: DEFAULT_NUM_FLOWS,
            flow_size: DEFAULT_FLOW_SIZE,
            min_chunk_size: MIN_CHUNK_SIZE,
            max_chunk_size: MAX_CHUNK_SIZE,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            pacing_delay_us: DEFAULT_PACING_DELAY_US,
        }
    }
}

impl Config {
    /// 새 설정 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 플로우 하나에 쓸 청크 크기를 [min, max]에서 균등 추출
    pub fn sample_chunk_size(&self) -> usize {
        rand::thread_rng().gen_range(self.min_chunk_size..=self.max_chunk_size)
    }

    /// 빠른 테스트용 설정 (작은 플로우, 짧은 페이싱)
    pub fn quick_test() -> Self {
        Self {
            flow_size: 16 * 1024, // 16KiB
            pacing_delay_us: 200,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_chunk_size_in_range() {
        let config = Config::default();
        for _ in 0..200 {
            let size = config.sample_chunk_size();
            assert!(size >= config.min_chunk_size);
            assert!(size <= config.max_chunk_size);
        }
    }

    #[test]
    fn test_default_matches_protocol_constants() {
        let config = Config::default();
        assert_eq!(config.num_flows, 3);
        assert_eq!(config.flow_size, 2 * 1024 * 1024);
        assert_eq!(config.recv_buffer_size, 2048);
        assert_eq!(config.server_addr.port(), 4433);
    }
}
