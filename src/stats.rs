//! 전송 통계
//!
//! 플로우 목록에 대한 순수 계산이다. 플로우별 데이터/패킷 속도와 전체
//! 집계를 구하고 사람이 읽는 리포트를 만든다.

use std::fmt;
use std::time::Duration;

use crate::flow::{Flow, FlowId};
use crate::{Error, Result};

/// 플로우 하나의 속도 요약
#[derive(Debug, Clone, PartialEq)]
pub struct FlowRates {
    /// 플로우 ID
    pub id: FlowId,

    /// 총 바이트
    pub total_bytes: usize,

    /// 총 패킷 수
    pub total_packets: u64,

    /// 데이터 속도 (bytes/sec). 미완료 플로우는 0
    pub data_rate: f64,

    /// 패킷 속도 (packets/sec). 미완료 플로우는 0
    pub packet_rate: f64,
}

/// 전송 리포트
#[derive(Debug, Clone)]
pub struct TransferReport {
    /// 플로우별 요약 (입력 순서 유지)
    pub flows: Vec<FlowRates>,

    /// 전 플로우 바이트 합
    pub total_bytes: usize,

    /// 전 플로우 패킷 합
    pub total_packets: u64,

    /// 집계 데이터 속도 (bytes/sec)
    pub total_data_rate: f64,

    /// 집계 패킷 속도 (packets/sec)
    pub total_packet_rate: f64,
}

/// duration이 양수일 때만 나눗셈, 아니면 0
fn rate(amount: f64, duration: Option<Duration>) -> f64 {
    match duration {
        Some(d) if d.as_secs_f64() > 0.0 => amount / d.as_secs_f64(),
        _ => 0.0,
    }
}

impl TransferReport {
    /// 플로우 목록에서 리포트 계산
    ///
    /// 집계 속도의 분모는 완료된 플로우들의 최대 소요 시간이다. 완료된
    /// 플로우가 하나도 없으면 분모가 없으므로 에러를 반환한다. 미완료
    /// 플로우의 바이트/패킷은 합계에는 들어가되 개별 속도는 0으로 둔다.
    pub fn from_flows(flows: &[Flow]) -> Result<Self> {
        let max_duration = flows
            .iter()
            .filter_map(|f| f.duration())
            .max()
            .ok_or(Error::NoCompletedFlows)?;

        let flow_rates: Vec<FlowRates> = flows
            .iter()
            .map(|f| FlowRates {
                id: f.id,
                total_bytes: f.total_bytes,
                total_packets: f.total_packets,
                data_rate: rate(f.total_bytes as f64, f.duration()),
                packet_rate: rate(f.total_packets as f64, f.duration()),
            })
            .collect();

        let total_bytes: usize = flows.iter().map(|f| f.total_bytes).sum();
        let total_packets: u64 = flows.iter().map(|f| f.total_packets).sum();

        Ok(Self {
            flows: flow_rates,
            total_bytes,
            total_packets,
            total_data_rate: rate(total_bytes as f64, Some(max_duration)),
            total_packet_rate: rate(total_packets as f64, Some(max_duration)),
        })
    }

    /// 사람이 읽는 리포트 텍스트 생성 (결정적)
    pub fn render(&self) -> String {
        let mut out = String::from("Flow statistics:\n");

        for flow in &self.flows {
            out.push_str(&format!("Flow {}:\n", flow.id));
            out.push_str(&format!("  Total bytes: {}\n", flow.total_bytes));
            out.push_str(&format!("  Total packets: {}\n", flow.total_packets));
            out.push_str(&format!("  Data rate: {:.2} bytes/second\n", flow.data_rate));
            out.push_str(&format!(
                "  Packet rate: {:.2} packets/second\n",
                flow.packet_rate
            ));
        }

        out.push_str("Overall statistics:\n");
        out.push_str(&format!(
            "  Total data rate: {:.2} bytes/second\n",
            self.total_data_rate
        ));
        out.push_str(&format!(
            "  Total packet rate: {:.2} packets/second\n",
            self.total_packet_rate
        ));

        out
    }
}

impl fmt::Display for TransferReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// record_packet으로 완료 상태까지 채운 플로우 생성
    fn completed_flow(id: FlowId, chunk: usize, total: usize) -> Flow {
        let mut flow = Flow::new(id, chunk, total);
        let mut sent = 0;
        while sent < total {
            let len = chunk.min(total - sent);
            flow.record_packet(len);
            sent += len;
        }
        assert!(flow.is_complete());
        flow
    }

    #[test]
    fn test_rates_match_direct_formula() {
        let flows = vec![
            completed_flow(1, 100, 1000),
            completed_flow(2, 300, 1200),
        ];

        let report = TransferReport::from_flows(&flows).unwrap();

        for (flow, rates) in flows.iter().zip(&report.flows) {
            let secs = flow.duration().unwrap().as_secs_f64();
            if secs > 0.0 {
                assert_eq!(rates.data_rate, flow.total_bytes as f64 / secs);
                assert_eq!(rates.packet_rate, flow.total_packets as f64 / secs);
            } else {
                assert_eq!(rates.data_rate, 0.0);
                assert_eq!(rates.packet_rate, 0.0);
            }
            assert!(rates.data_rate.is_finite());
            assert!(rates.data_rate >= 0.0);
        }

        let max_secs = flows
            .iter()
            .filter_map(|f| f.duration())
            .max()
            .unwrap()
            .as_secs_f64();
        assert_eq!(report.total_bytes, 2200);
        if max_secs > 0.0 {
            assert_eq!(report.total_data_rate, 2200.0 / max_secs);
        }
    }

    #[test]
    fn test_all_incomplete_is_error() {
        let mut flow = Flow::new(1, 100, 1000);
        flow.record_packet(100);

        let result = TransferReport::from_flows(&[flow]);
        assert!(matches!(result, Err(Error::NoCompletedFlows)));
    }

    #[test]
    fn test_incomplete_flow_contributes_zero_rate() {
        let complete = completed_flow(1, 100, 500);
        let mut incomplete = Flow::new(2, 100, 1000);
        incomplete.record_packet(100);

        let report = TransferReport::from_flows(&[complete, incomplete]).unwrap();

        assert_eq!(report.flows[1].data_rate, 0.0);
        assert_eq!(report.flows[1].packet_rate, 0.0);
        // 미완료 플로우의 바이트도 합계에는 포함된다
        assert_eq!(report.total_bytes, 600);
    }

    #[test]
    fn test_render_is_deterministic() {
        let flows = vec![completed_flow(1, 100, 400), completed_flow(2, 100, 400)];
        let report = TransferReport::from_flows(&flows).unwrap();

        let first = report.render();
        let second = report.render();
        assert_eq!(first, second);

        assert!(first.starts_with("Flow statistics:\n"));
        assert!(first.contains("Flow 1:\n"));
        assert!(first.contains("Flow 2:\n"));
        assert!(first.contains("  Total bytes: 400\n"));
        assert!(first.contains("Overall statistics:\n"));
        assert_eq!(first, format!("{}", report));
    }
}
