//! 연결 상태와 레지스트리
//!
//! 서버는 피어 주소당 Connection 하나를 유지한다. 첫 패킷에서 생성되고
//! 프로세스 종료까지 제거되지 않는다 (단일 클라이언트 전제의 알려진 제약).

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;

use tokio::sync::mpsc;
use tracing::debug;

use crate::flow::{FlowId, SendFlow};
use crate::packet::{generate_random_file, LongHeader};
use crate::Config;

/// ACK 관찰 이벤트
///
/// ACK는 기록될 뿐 재전송이나 페이싱 변경을 일으키지 않는다. 손실 복구를
/// 붙이고 싶은 쪽이 구독할 수 있는 확장 지점으로만 노출한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckEvent {
    /// ACK를 보낸 피어
    pub peer: SocketAddr,

    /// 대상 플로우 ID
    pub flow_id: FlowId,

    /// 확인된 패킷 번호
    pub packet_number: u32,
}

/// 피어 하나에 대한 연결 상태
#[derive(Debug)]
pub struct Connection {
    /// 클라이언트가 할당한 연결 ID (서버는 불투명 값으로 보관)
    pub connection_id: u32,

    /// 이 연결에 속한 송신 플로우들 (id 1..=num_flows)
    pub flows: Vec<SendFlow>,

    /// 마지막으로 관찰한 패킷 번호
    pub last_packet_number: u32,

    /// 피어가 확인한 (플로우 ID, 패킷 번호) 쌍
    acks: HashSet<(FlowId, u32)>,
}

impl Connection {
    fn new(header: &LongHeader, config: &Config) -> Self {
        let flows = (1..=config.num_flows)
            .map(|id| {
                SendFlow::new(
                    id,
                    config.sample_chunk_size(),
                    generate_random_file(config.flow_size),
                )
            })
            .collect();

        Self {
            connection_id: header.connection_id,
            flows,
            last_packet_number: header.packet_number,
            acks: HashSet::new(),
        }
    }

    /// ACK 기록. 새로 추가된 쌍이면 true
    pub fn record_ack(&mut self, flow_id: FlowId, packet_number: u32) -> bool {
        self.acks.insert((flow_id, packet_number))
    }

    /// 해당 (플로우, 패킷)이 확인되었는지
    pub fn is_acked(&self, flow_id: FlowId, packet_number: u32) -> bool {
        self.acks.contains(&(flow_id, packet_number))
    }

    /// 기록된 ACK 수
    pub fn ack_count(&self) -> usize {
        self.acks.len()
    }

    /// 모든 플로우가 전송을 마쳤는지
    pub fn all_flows_complete(&self) -> bool {
        self.flows.iter().all(|f| f.flow.is_complete())
    }
}

/// 피어 주소 키의 연결 저장소
///
/// 엔트리를 퇴거하지 않는다. 장기 다중 클라이언트 운용에는 퇴거 정책이
/// 필요하지만 이 프로토콜은 단일 클라이언트 전제라 두지 않는다.
pub struct ConnectionRegistry {
    connections: HashMap<SocketAddr, Connection>,
    ack_tx: Option<mpsc::UnboundedSender<AckEvent>>,
}

impl ConnectionRegistry {
    /// 빈 레지스트리 생성
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            ack_tx: None,
        }
    }

    /// 해당 피어의 연결 존재 여부
    pub fn contains(&self, peer: &SocketAddr) -> bool {
        self.connections.contains_key(peer)
    }

    /// 첫 접촉 등록: 연결과 플로우들을 생성
    ///
    /// 이미 등록된 피어면 기존 연결을 그대로 반환한다 (멱등).
    pub fn register(
        &mut self,
        peer: SocketAddr,
        header: &LongHeader,
        config: &Config,
    ) -> &mut Connection {
        self.connections
            .entry(peer)
            .or_insert_with(|| Connection::new(header, config))
    }

    /// 연결 조회
    pub fn get(&self, peer: &SocketAddr) -> Option<&Connection> {
        self.connections.get(peer)
    }

    /// 연결 조회 (가변)
    pub fn get_mut(&mut self, peer: &SocketAddr) -> Option<&mut Connection> {
        self.connections.get_mut(peer)
    }

    /// ACK 기록 (관찰 전용)
    ///
    /// 등록되지 않은 피어의 ACK는 무시한다.
    pub fn record_ack(&mut self, peer: SocketAddr, flow_id: FlowId, packet_number: u32) {
        let Some(connection) = self.connections.get_mut(&peer) else {
            debug!("미등록 피어 {}의 ACK 무시", peer);
            return;
        };

        if connection.record_ack(flow_id, packet_number) {
            if let Some(tx) = &self.ack_tx {
                let _ = tx.send(AckEvent {
                    peer,
                    flow_id,
                    packet_number,
                });
            }
        }
    }

    /// ACK 이벤트 구독
    ///
    /// 이후 기록되는 새 ACK가 채널로 발행된다. 레지스트리는 수신측이
    /// 채널을 버려도 동작에 영향을 받지 않는다.
    pub fn subscribe_acks(&mut self) -> mpsc::UnboundedReceiver<AckEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.ack_tx = Some(tx);
        rx
    }

    /// 등록된 연결 수
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// 비어 있는지
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn test_config() -> Config {
        Config {
            flow_size: 4096,
            ..Config::default()
        }
    }

    fn test_header() -> LongHeader {
        LongHeader {
            connection_id: 777,
            packet_number: 42,
            flow_id: 0,
            payload: Bytes::from_static(b"hello"),
        }
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    #[test]
    fn test_register_creates_flows() {
        let config = test_config();
        let mut registry = ConnectionRegistry::new();

        let connection = registry.register(peer(), &test_header(), &config);
        assert_eq!(connection.connection_id, 777);
        assert_eq!(connection.last_packet_number, 42);
        assert_eq!(connection.flows.len(), 3);

        for (i, send_flow) in connection.flows.iter().enumerate() {
            assert_eq!(send_flow.flow.id, i as u32 + 1);
            assert_eq!(send_flow.flow.total_size, 4096);
            assert!(send_flow.flow.chunk_size >= config.min_chunk_size);
            assert!(send_flow.flow.chunk_size <= config.max_chunk_size);
        }
    }

    #[test]
    fn test_register_is_idempotent() {
        let config = test_config();
        let mut registry = ConnectionRegistry::new();

        registry.register(peer(), &test_header(), &config);
        let other = LongHeader {
            connection_id: 999,
            ..test_header()
        };
        let connection = registry.register(peer(), &other, &config);

        // 두 번째 등록은 기존 연결을 유지한다
        assert_eq!(connection.connection_id, 777);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_record_ack() {
        let config = test_config();
        let mut registry = ConnectionRegistry::new();
        registry.register(peer(), &test_header(), &config);

        registry.record_ack(peer(), 1, 10);
        registry.record_ack(peer(), 1, 10); // 중복은 집합이 흡수
        registry.record_ack(peer(), 2, 5);

        let connection = registry.get(&peer()).unwrap();
        assert_eq!(connection.ack_count(), 2);
        assert!(connection.is_acked(1, 10));
        assert!(connection.is_acked(2, 5));
        assert!(!connection.is_acked(3, 1));
    }

    #[test]
    fn test_ack_for_unknown_peer_ignored() {
        let mut registry = ConnectionRegistry::new();
        registry.record_ack(peer(), 1, 1);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_ack_events_published() {
        let config = test_config();
        let mut registry = ConnectionRegistry::new();
        let mut rx = registry.subscribe_acks();

        registry.register(peer(), &test_header(), &config);
        registry.record_ack(peer(), 2, 33);

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            AckEvent {
                peer: peer(),
                flow_id: 2,
                packet_number: 33,
            }
        );

        // 중복 ACK는 이벤트를 다시 발행하지 않는다
        registry.record_ack(peer(), 2, 33);
        assert!(rx.try_recv().is_err());
    }
}
