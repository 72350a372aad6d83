//! Technical indicators.
//!
//! The `*_on_array` variants compute over caller-supplied data. The array
//! travels as its length followed by its elements, ahead of the remaining
//! arguments.
#![allow(clippy::too_many_arguments)]

use mtapi_common::command::CommandBuilder;
use mtapi_common::types::ChartPeriod;
use mtapi_common::{Command, MtCommandType};

use crate::client::MtApiClient;

fn on_chart(operation: MtCommandType, symbol: &str, timeframe: ChartPeriod) -> CommandBuilder {
    Command::builder(operation)
        .arg(symbol)
        .arg(timeframe as i32)
}

impl MtApiClient {
    /// Accelerator/Decelerator oscillator.
    pub fn i_ac(&self, symbol: &str, timeframe: ChartPeriod, shift: i32) -> f64 {
        self.invoke(on_chart(MtCommandType::iAC, symbol, timeframe).arg(shift).build())
    }

    /// Accumulation/Distribution.
    pub fn i_ad(&self, symbol: &str, timeframe: ChartPeriod, shift: i32) -> f64 {
        self.invoke(on_chart(MtCommandType::iAD, symbol, timeframe).arg(shift).build())
    }

    /// Alligator.
    pub fn i_alligator(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        jaw_period: i32,
        jaw_shift: i32,
        teeth_period: i32,
        teeth_shift: i32,
        lips_period: i32,
        lips_shift: i32,
        ma_method: i32,
        applied_price: i32,
        mode: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iAlligator, symbol, timeframe)
                .arg(jaw_period)
                .arg(jaw_shift)
                .arg(teeth_period)
                .arg(teeth_shift)
                .arg(lips_period)
                .arg(lips_shift)
                .arg(ma_method)
                .arg(applied_price)
                .arg(mode)
                .arg(shift)
                .build(),
        )
    }

    /// Average Directional Movement Index.
    pub fn i_adx(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        period: i32,
        applied_price: i32,
        mode: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iADX, symbol, timeframe)
                .arg(period)
                .arg(applied_price)
                .arg(mode)
                .arg(shift)
                .build(),
        )
    }

    /// Average True Range.
    pub fn i_atr(&self, symbol: &str, timeframe: ChartPeriod, period: i32, shift: i32) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iATR, symbol, timeframe)
                .arg(period)
                .arg(shift)
                .build(),
        )
    }

    /// Awesome oscillator.
    pub fn i_ao(&self, symbol: &str, timeframe: ChartPeriod, shift: i32) -> f64 {
        self.invoke(on_chart(MtCommandType::iAO, symbol, timeframe).arg(shift).build())
    }

    /// Bears Power.
    pub fn i_bears_power(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        period: i32,
        applied_price: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iBearsPower, symbol, timeframe)
                .arg(period)
                .arg(applied_price)
                .arg(shift)
                .build(),
        )
    }

    /// Bollinger Bands.
    pub fn i_bands(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        period: i32,
        deviation: i32,
        bands_shift: i32,
        applied_price: i32,
        mode: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iBands, symbol, timeframe)
                .arg(period)
                .arg(deviation)
                .arg(bands_shift)
                .arg(applied_price)
                .arg(mode)
                .arg(shift)
                .build(),
        )
    }

    /// Bollinger Bands over `array`.
    pub fn i_bands_on_array(
        &self,
        array: &[f64],
        total: i32,
        period: i32,
        deviation: i32,
        bands_shift: i32,
        mode: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            Command::builder(MtCommandType::iBandsOnArray)
                .counted(array)
                .arg(total)
                .arg(period)
                .arg(deviation)
                .arg(bands_shift)
                .arg(mode)
                .arg(shift)
                .build(),
        )
    }

    /// Bulls Power.
    pub fn i_bulls_power(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        period: i32,
        applied_price: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iBullsPower, symbol, timeframe)
                .arg(period)
                .arg(applied_price)
                .arg(shift)
                .build(),
        )
    }

    /// Commodity Channel Index.
    pub fn i_cci(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        period: i32,
        applied_price: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iCCI, symbol, timeframe)
                .arg(period)
                .arg(applied_price)
                .arg(shift)
                .build(),
        )
    }

    /// Commodity Channel Index over `array`.
    pub fn i_cci_on_array(&self, array: &[f64], total: i32, period: i32, shift: i32) -> f64 {
        self.invoke(
            Command::builder(MtCommandType::iCCIOnArray)
                .counted(array)
                .arg(total)
                .arg(period)
                .arg(shift)
                .build(),
        )
    }

    /// Custom indicator `name` with integer inputs.
    pub fn i_custom(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        name: &str,
        parameters: &[i32],
        mode: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iCustom, symbol, timeframe)
                .arg(name)
                .counted(parameters)
                .arg(mode)
                .arg(shift)
                .build(),
        )
    }

    /// Custom indicator `name` with floating-point inputs.
    pub fn i_custom_f64(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        name: &str,
        parameters: &[f64],
        mode: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iCustom_d, symbol, timeframe)
                .arg(name)
                .counted(parameters)
                .arg(mode)
                .arg(shift)
                .build(),
        )
    }

    /// DeMarker.
    pub fn i_de_marker(&self, symbol: &str, timeframe: ChartPeriod, period: i32, shift: i32) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iDeMarker, symbol, timeframe)
                .arg(period)
                .arg(shift)
                .build(),
        )
    }

    /// Envelopes.
    pub fn i_envelopes(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        ma_period: i32,
        ma_method: i32,
        ma_shift: i32,
        applied_price: i32,
        deviation: f64,
        mode: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iEnvelopes, symbol, timeframe)
                .arg(ma_period)
                .arg(ma_method)
                .arg(ma_shift)
                .arg(applied_price)
                .arg(deviation)
                .arg(mode)
                .arg(shift)
                .build(),
        )
    }

    /// Envelopes over `array`.
    pub fn i_envelopes_on_array(
        &self,
        array: &[f64],
        total: i32,
        ma_period: i32,
        ma_method: i32,
        ma_shift: i32,
        deviation: f64,
        mode: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            Command::builder(MtCommandType::iEnvelopesOnArray)
                .counted(array)
                .arg(total)
                .arg(ma_period)
                .arg(ma_method)
                .arg(ma_shift)
                .arg(deviation)
                .arg(mode)
                .arg(shift)
                .build(),
        )
    }

    /// Force Index.
    pub fn i_force(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        period: i32,
        ma_method: i32,
        applied_price: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iForce, symbol, timeframe)
                .arg(period)
                .arg(ma_method)
                .arg(applied_price)
                .arg(shift)
                .build(),
        )
    }

    /// Fractals.
    pub fn i_fractals(&self, symbol: &str, timeframe: ChartPeriod, mode: i32, shift: i32) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iFractals, symbol, timeframe)
                .arg(mode)
                .arg(shift)
                .build(),
        )
    }

    /// Gator oscillator.
    pub fn i_gator(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        jaw_period: i32,
        jaw_shift: i32,
        teeth_period: i32,
        teeth_shift: i32,
        lips_period: i32,
        lips_shift: i32,
        ma_method: i32,
        applied_price: i32,
        mode: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iGator, symbol, timeframe)
                .arg(jaw_period)
                .arg(jaw_shift)
                .arg(teeth_period)
                .arg(teeth_shift)
                .arg(lips_period)
                .arg(lips_shift)
                .arg(ma_method)
                .arg(applied_price)
                .arg(mode)
                .arg(shift)
                .build(),
        )
    }

    /// Ichimoku Kinko Hyo.
    pub fn i_ichimoku(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        tenkan_sen: i32,
        kijun_sen: i32,
        senkou_span_b: i32,
        mode: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iIchimoku, symbol, timeframe)
                .arg(tenkan_sen)
                .arg(kijun_sen)
                .arg(senkou_span_b)
                .arg(mode)
                .arg(shift)
                .build(),
        )
    }

    /// Market Facilitation Index.
    pub fn i_bwmfi(&self, symbol: &str, timeframe: ChartPeriod, shift: i32) -> f64 {
        self.invoke(on_chart(MtCommandType::iBWMFI, symbol, timeframe).arg(shift).build())
    }

    /// Momentum.
    pub fn i_momentum(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        period: i32,
        applied_price: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iMomentum, symbol, timeframe)
                .arg(period)
                .arg(applied_price)
                .arg(shift)
                .build(),
        )
    }

    /// Momentum over `array`.
    pub fn i_momentum_on_array(&self, array: &[f64], total: i32, period: i32, shift: i32) -> f64 {
        self.invoke(
            Command::builder(MtCommandType::iMomentumOnArray)
                .counted(array)
                .arg(total)
                .arg(period)
                .arg(shift)
                .build(),
        )
    }

    /// Money Flow Index.
    pub fn i_mfi(&self, symbol: &str, timeframe: ChartPeriod, period: i32, shift: i32) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iMFI, symbol, timeframe)
                .arg(period)
                .arg(shift)
                .build(),
        )
    }

    /// Moving Average.
    pub fn i_ma(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        period: i32,
        ma_shift: i32,
        ma_method: i32,
        applied_price: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iMA, symbol, timeframe)
                .arg(period)
                .arg(ma_shift)
                .arg(ma_method)
                .arg(applied_price)
                .arg(shift)
                .build(),
        )
    }

    /// Moving Average over `array`.
    pub fn i_ma_on_array(
        &self,
        array: &[f64],
        total: i32,
        period: i32,
        ma_shift: i32,
        ma_method: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            Command::builder(MtCommandType::iMAOnArray)
                .counted(array)
                .arg(total)
                .arg(period)
                .arg(ma_shift)
                .arg(ma_method)
                .arg(shift)
                .build(),
        )
    }

    /// Moving Average of Oscillator.
    pub fn i_os_ma(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        fast_ema_period: i32,
        slow_ema_period: i32,
        signal_period: i32,
        applied_price: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iOsMA, symbol, timeframe)
                .arg(fast_ema_period)
                .arg(slow_ema_period)
                .arg(signal_period)
                .arg(applied_price)
                .arg(shift)
                .build(),
        )
    }

    /// MACD.
    pub fn i_macd(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        fast_ema_period: i32,
        slow_ema_period: i32,
        signal_period: i32,
        applied_price: i32,
        mode: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iMACD, symbol, timeframe)
                .arg(fast_ema_period)
                .arg(slow_ema_period)
                .arg(signal_period)
                .arg(applied_price)
                .arg(mode)
                .arg(shift)
                .build(),
        )
    }

    /// On Balance Volume.
    pub fn i_obv(&self, symbol: &str, timeframe: ChartPeriod, applied_price: i32, shift: i32) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iOBV, symbol, timeframe)
                .arg(applied_price)
                .arg(shift)
                .build(),
        )
    }

    /// Parabolic SAR.
    pub fn i_sar(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        step: f64,
        maximum: f64,
        shift: i32,
    ) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iSAR, symbol, timeframe)
                .arg(step)
                .arg(maximum)
                .arg(shift)
                .build(),
        )
    }

    /// Relative Strength Index.
    pub fn i_rsi(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        period: i32,
        applied_price: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iRSI, symbol, timeframe)
                .arg(period)
                .arg(applied_price)
                .arg(shift)
                .build(),
        )
    }

    /// Relative Strength Index over `array`.
    pub fn i_rsi_on_array(&self, array: &[f64], total: i32, period: i32, shift: i32) -> f64 {
        self.invoke(
            Command::builder(MtCommandType::iRSIOnArray)
                .counted(array)
                .arg(total)
                .arg(period)
                .arg(shift)
                .build(),
        )
    }

    /// Relative Vigor Index.
    pub fn i_rvi(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        period: i32,
        mode: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iRVI, symbol, timeframe)
                .arg(period)
                .arg(mode)
                .arg(shift)
                .build(),
        )
    }

    /// Standard Deviation.
    pub fn i_std_dev(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        ma_period: i32,
        ma_shift: i32,
        ma_method: i32,
        applied_price: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iStdDev, symbol, timeframe)
                .arg(ma_period)
                .arg(ma_shift)
                .arg(ma_method)
                .arg(applied_price)
                .arg(shift)
                .build(),
        )
    }

    /// Standard Deviation over `array`.
    pub fn i_std_dev_on_array(
        &self,
        array: &[f64],
        total: i32,
        ma_period: i32,
        ma_shift: i32,
        ma_method: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            Command::builder(MtCommandType::iStdDevOnArray)
                .counted(array)
                .arg(total)
                .arg(ma_period)
                .arg(ma_shift)
                .arg(ma_method)
                .arg(shift)
                .build(),
        )
    }

    /// Stochastic oscillator.
    pub fn i_stochastic(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        k_period: i32,
        d_period: i32,
        slowing: i32,
        method: i32,
        price_field: i32,
        mode: i32,
        shift: i32,
    ) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iStochastic, symbol, timeframe)
                .arg(k_period)
                .arg(d_period)
                .arg(slowing)
                .arg(method)
                .arg(price_field)
                .arg(mode)
                .arg(shift)
                .build(),
        )
    }

    /// Larry Williams' Percent Range.
    pub fn i_wpr(&self, symbol: &str, timeframe: ChartPeriod, period: i32, shift: i32) -> f64 {
        self.invoke(
            on_chart(MtCommandType::iWPR, symbol, timeframe)
                .arg(period)
                .arg(shift)
                .build(),
        )
    }
}
