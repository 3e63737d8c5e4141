
use serde::{Serialize, Deserialize};

use crate::units::{fmt_hz, fmt_pct, fmt_s, fmt_v};

// The single-source measurement catalog of the :MEASure subsystem.  Each
// entry knows its SCPI leaf (sent with or without a trailing `?`) and the
// unit kind used to format readings for an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Measurement {
	VMax,
	VMin,
	VPp,
	VTop,
	VBase,
	VAmplitude,
	VAverage,
	VRms,
	RiseTime,
	FallTime,
	Frequency,
	Period,
	PositiveWidth,
	NegativeWidth,
	PositiveEdges,
	NegativeEdges,
	PositivePulses,
	NegativePulses,
	DutyCycle,
	NegativeDuty,
	Overshoot,
	Preshoot,
	StdDeviation,
	Area,
	BurstWidth,
	TimeAtVMax,
	TimeAtVMin,
	CounterFrequency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitKind { Volt, Second, Hertz, Percent, Count, VoltSecond }

pub const ALL_MEASUREMENTS:[Measurement; 28] = [
	Measurement::VMax,
	Measurement::VMin,
	Measurement::VPp,
	Measurement::VTop,
	Measurement::VBase,
	Measurement::VAmplitude,
	Measurement::VAverage,
	Measurement::VRms,
	Measurement::RiseTime,
	Measurement::FallTime,
	Measurement::Frequency,
	Measurement::Period,
	Measurement::PositiveWidth,
	Measurement::NegativeWidth,
	Measurement::PositiveEdges,
	Measurement::NegativeEdges,
	Measurement::PositivePulses,
	Measurement::NegativePulses,
	Measurement::DutyCycle,
	Measurement::NegativeDuty,
	Measurement::Overshoot,
	Measurement::Preshoot,
	Measurement::StdDeviation,
	Measurement::Area,
	Measurement::BurstWidth,
	Measurement::TimeAtVMax,
	Measurement::TimeAtVMin,
	Measurement::CounterFrequency,
];

impl Measurement {

	pub fn scpi_leaf(&self) -> &'static str {
		match self {
			Measurement::VMax             => "VMAX",
			Measurement::VMin             => "VMIN",
			Measurement::VPp              => "VPP",
			Measurement::VTop             => "VTOP",
			Measurement::VBase            => "VBASe",
			Measurement::VAmplitude       => "VAMPlitude",
			Measurement::VAverage         => "VAVerage",
			Measurement::VRms             => "VRMS",
			Measurement::RiseTime         => "RISetime",
			Measurement::FallTime         => "FALLtime",
			Measurement::Frequency        => "FREQuency",
			Measurement::Period           => "PERiod",
			Measurement::PositiveWidth    => "PWIDth",
			Measurement::NegativeWidth    => "NWIDth",
			Measurement::PositiveEdges    => "PEDGes",
			Measurement::NegativeEdges    => "NEDGes",
			Measurement::PositivePulses   => "PPULses",
			Measurement::NegativePulses   => "NPULses",
			Measurement::DutyCycle        => "DUTYcycle",
			Measurement::NegativeDuty     => "NDUTy",
			Measurement::Overshoot        => "OVERshoot",
			Measurement::Preshoot         => "PREShoot",
			Measurement::StdDeviation     => "SDEViation",
			Measurement::Area             => "AREa",
			Measurement::BurstWidth       => "BWIDth",
			Measurement::TimeAtVMax       => "XMAX",
			Measurement::TimeAtVMin       => "XMIN",
			Measurement::CounterFrequency => "COUNter",
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			Measurement::VMax             => "Vmax",
			Measurement::VMin             => "Vmin",
			Measurement::VPp              => "Vpp",
			Measurement::VTop             => "Vtop",
			Measurement::VBase            => "Vbase",
			Measurement::VAmplitude       => "Vamp",
			Measurement::VAverage         => "Vavg",
			Measurement::VRms             => "Vrms",
			Measurement::RiseTime         => "Rise time",
			Measurement::FallTime         => "Fall time",
			Measurement::Frequency        => "Freq",
			Measurement::Period           => "Period",
			Measurement::PositiveWidth    => "+Width",
			Measurement::NegativeWidth    => "-Width",
			Measurement::PositiveEdges    => "+Edges",
			Measurement::NegativeEdges    => "-Edges",
			Measurement::PositivePulses   => "+Pulses",
			Measurement::NegativePulses   => "-Pulses",
			Measurement::DutyCycle        => "Duty (+)",
			Measurement::NegativeDuty     => "Duty (-)",
			Measurement::Overshoot        => "Overshoot",
			Measurement::Preshoot         => "Preshoot",
			Measurement::StdDeviation     => "Std Dev",
			Measurement::Area             => "Area",
			Measurement::BurstWidth       => "Burst Width",
			Measurement::TimeAtVMax       => "T@Vmax",
			Measurement::TimeAtVMin       => "T@Vmin",
			Measurement::CounterFrequency => "Counter Freq",
		}
	}

	pub fn unit(&self) -> UnitKind {
		match self {
			Measurement::VMax
			| Measurement::VMin
			| Measurement::VPp
			| Measurement::VTop
			| Measurement::VBase
			| Measurement::VAmplitude
			| Measurement::VAverage
			| Measurement::VRms
			| Measurement::StdDeviation   => UnitKind::Volt,
			Measurement::RiseTime
			| Measurement::FallTime
			| Measurement::Period
			| Measurement::PositiveWidth
			| Measurement::NegativeWidth
			| Measurement::BurstWidth
			| Measurement::TimeAtVMax
			| Measurement::TimeAtVMin     => UnitKind::Second,
			Measurement::Frequency
			| Measurement::CounterFrequency => UnitKind::Hertz,
			Measurement::DutyCycle
			| Measurement::NegativeDuty
			| Measurement::Overshoot
			| Measurement::Preshoot       => UnitKind::Percent,
			Measurement::PositiveEdges
			| Measurement::NegativeEdges
			| Measurement::PositivePulses
			| Measurement::NegativePulses => UnitKind::Count,
			Measurement::Area             => UnitKind::VoltSecond,
		}
	}

}

impl UnitKind {

	pub fn format(&self, value:f64) -> String {
		match self {
			UnitKind::Volt       => fmt_v(value),
			UnitKind::Second     => fmt_s(value),
			UnitKind::Hertz      => fmt_hz(value),
			UnitKind::Percent    => fmt_pct(value),
			UnitKind::Count      => format!("{}", value.round() as i64),
			UnitKind::VoltSecond => format!("{} V*s", value),
		}
	}

}
