//! 플로우 상태
//!
//! - Flow: 연결 안의 논리 스트림 하나에 대한 전송 카운터와 타임스탬프
//! - SendFlow: 서버측 전용, 남은 송신 버퍼와 시퀀스 번호를 추가로 보유

use std::time::{Duration, Instant};

use bytes::Bytes;

/// 플로우 ID (연결 내 고유, 1부터 연속 할당)
pub type FlowId = u32;

/// 플로우 전송 상태
#[derive(Debug, Clone)]
pub struct Flow {
    /// 플로우 ID
    pub id: FlowId,

    /// 패킷당 청크 크기 (플로우 생성 시 한 번 추출)
    pub chunk_size: usize,

    /// 전송 목표 크기 (바이트)
    pub total_size: usize,

    /// 지금까지 전송/수신한 바이트
    pub total_bytes: usize,

    /// 지금까지 전송/수신한 패킷 수
    pub total_packets: u64,

    /// 첫 활동 시각 (생성 시점)
    started_at: Instant,

    /// 완료 시각. 목표 크기 도달 시 정확히 한 번 기록
    completed_at: Option<Instant>,

    /// 마지막 활동 시각 (패킷마다 갱신)
    last_activity: Instant,
}

impl Flow {
    /// 새 플로우 생성
    pub fn new(id: FlowId, chunk_size: usize, total_size: usize) -> Self {
        let now = Instant::now();
        Self {
            id,
            chunk_size,
            total_size,
            total_bytes: 0,
            total_packets: 0,
            started_at: now,
            completed_at: None,
            last_activity: now,
        }
    }

    /// 패킷 하나 전송/수신 기록
    ///
    /// 완료 시각은 목표 크기에 도달하는 순간 한 번만 기록된다.
    /// last_activity는 매 패킷 갱신된다 (완료 시각과는 별개 개념).
    pub fn record_packet(&mut self, len: usize) {
        let now = Instant::now();
        self.total_bytes += len;
        self.total_packets += 1;
        self.last_activity = now;

        if self.total_bytes >= self.total_size && self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
    }

    /// 완료 여부
    pub fn is_complete(&self) -> bool {
        self.total_bytes >= self.total_size
    }

    /// 시작부터 완료까지의 소요 시간. 미완료면 None
    pub fn duration(&self) -> Option<Duration> {
        self.completed_at
            .map(|end| end.duration_since(self.started_at))
    }

    /// 첫 활동 시각
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// 마지막 활동 시각
    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }
}

/// 서버측 송신 플로우
///
/// 남은 버퍼에서 청크를 떼어내며 시퀀스 번호를 1부터 1씩 올린다.
#[derive(Debug)]
pub struct SendFlow {
    /// 공통 플로우 상태
    pub flow: Flow,

    /// 아직 보내지 않은 페이로드
    remaining: Bytes,

    /// 마지막으로 사용한 시퀀스 번호
    last_seq: u32,
}

impl SendFlow {
    /// 새 송신 플로우 생성. 목표 크기는 data 길이로 고정된다
    pub fn new(id: FlowId, chunk_size: usize, data: Bytes) -> Self {
        Self {
            flow: Flow::new(id, chunk_size, data.len()),
            remaining: data,
            last_seq: 0,
        }
    }

    /// 다음 청크를 떼어내고 (시퀀스 번호, 청크)를 반환
    ///
    /// 마지막 청크는 chunk_size보다 짧을 수 있다. 버퍼가 비면 None.
    pub fn next_chunk(&mut self) -> Option<(u32, Bytes)> {
        if self.remaining.is_empty() {
            return None;
        }

        let take = self.flow.chunk_size.min(self.remaining.len());
        let chunk = self.remaining.split_to(take);

        self.last_seq += 1;
        self.flow.record_packet(chunk.len());

        Some((self.last_seq, chunk))
    }

    /// 마지막으로 사용한 시퀀스 번호
    pub fn last_seq(&self) -> u32 {
        self.last_seq
    }

    /// 남은 바이트
    pub fn remaining_bytes(&self) -> usize {
        self.remaining.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::generate_random_file;

    #[test]
    fn test_send_flow_drains_in_order() {
        let mut flow = SendFlow::new(1, 100, generate_random_file(250));

        let mut expected_seq = 0u32;
        let mut sent = 0usize;
        let mut last_len = 0usize;

        while let Some((seq, chunk)) = flow.next_chunk() {
            expected_seq += 1;
            assert_eq!(seq, expected_seq);
            assert!(chunk.len() <= 100);
            sent += chunk.len();
            last_len = chunk.len();
        }

        assert_eq!(expected_seq, 3);
        assert_eq!(sent, 250);
        assert_eq!(last_len, 50); // 마지막 청크는 더 짧다
        assert_eq!(flow.flow.total_bytes, 250);
        assert_eq!(flow.flow.total_packets, 3);
        assert!(flow.flow.is_complete());
        assert_eq!(flow.remaining_bytes(), 0);
    }

    #[test]
    fn test_send_flow_never_exceeds_total() {
        let mut flow = SendFlow::new(2, 64, generate_random_file(200));

        while flow.next_chunk().is_some() {
            assert!(flow.flow.total_bytes <= flow.flow.total_size);
        }

        assert_eq!(flow.flow.total_bytes, flow.flow.total_size);
        assert!(flow.next_chunk().is_none());
    }

    #[test]
    fn test_completion_set_once() {
        let mut flow = Flow::new(1, 100, 300);
        assert!(!flow.is_complete());
        assert!(flow.duration().is_none());

        flow.record_packet(150);
        assert!(!flow.is_complete());
        assert!(flow.duration().is_none());

        flow.record_packet(150);
        assert!(flow.is_complete());
        let first = flow.duration().unwrap();

        // 완료 이후 추가 패킷이 와도 완료 시각은 바뀌지 않는다
        std::thread::sleep(Duration::from_millis(5));
        flow.record_packet(10);
        assert_eq!(flow.duration().unwrap(), first);
        assert!(flow.last_activity() > flow.started_at());
    }

    #[test]
    fn test_record_packet_counters() {
        let mut flow = Flow::new(3, 1000, 5000);
        flow.record_packet(1000);
        flow.record_packet(800);

        assert_eq!(flow.total_bytes, 1800);
        assert_eq!(flow.total_packets, 2);
        assert!(!flow.is_complete());
    }
}
